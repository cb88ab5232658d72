//! Notes and the encrypted logs that carry them to their owners.
use serde::{Deserialize, Serialize};

use crate::{
    address::Address,
    codec::SerdeOp as _,
    crypto::{
        hash_fields, Ciphertext, EncryptionError, Fr, PublicKey, NOTE_DOMAIN, NULLIFIER_DOMAIN,
    },
};

/// Opaque note contents, interpreted by the contract that owns the slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub items: Vec<Fr>,
    pub randomness: Fr,
}

impl Note {
    #[must_use]
    pub const fn new(items: Vec<Fr>, randomness: Fr) -> Self {
        Self { items, randomness }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePayload {
    pub contract: Address,
    pub storage_slot: Fr,
    pub note: Note,
}

impl NotePayload {
    #[must_use]
    pub fn commitment(&self) -> Fr {
        let mut preimage = vec![
            self.contract.to_field(),
            self.storage_slot,
            self.note.randomness,
        ];
        preimage.extend(&self.note.items);
        hash_fields(NOTE_DOMAIN, &preimage)
    }

    #[must_use]
    pub fn nullifier(&self) -> Fr {
        nullifier_of(&self.commitment())
    }
}

#[must_use]
pub fn nullifier_of(commitment: &Fr) -> Fr {
    hash_fields(NULLIFIER_DOMAIN, &[*commitment])
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedLog(Ciphertext);

impl EncryptedLog {
    pub fn encrypt(payload: &NotePayload, recipient: &PublicKey) -> Result<Self, EncryptionError> {
        Ciphertext::encrypt(&payload.to_bytes()?, recipient).map(Self)
    }

    /// Opens the log with an account key. Fails for logs meant for somebody
    /// else.
    pub fn decrypt(&self, secret: &k256::SecretKey) -> Result<NotePayload, EncryptionError> {
        let plaintext = self.0.decrypt(secret)?;
        Ok(NotePayload::from_bytes(&plaintext)?)
    }

    #[must_use]
    pub const fn ciphertext(&self) -> &Ciphertext {
        &self.0
    }
}

impl From<Ciphertext> for EncryptedLog {
    fn from(ciphertext: Ciphertext) -> Self {
        Self(ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;

    fn payload(value: u64, randomness: u64) -> NotePayload {
        NotePayload {
            contract: Address::new(Fr::from(9u64)),
            storage_slot: Fr::ONE,
            note: Note::new(vec![Fr::from(value)], Fr::from(randomness)),
        }
    }

    #[test]
    fn randomness_hides_equal_notes() {
        assert_ne!(payload(5, 1).commitment(), payload(5, 2).commitment());
        assert_eq!(payload(5, 1).nullifier(), payload(5, 1).nullifier());
        assert_ne!(payload(5, 1).commitment(), payload(5, 1).nullifier());
    }

    #[test]
    fn logs_open_for_their_recipient() {
        let owner = k256::SecretKey::random(&mut OsRng);
        let log = EncryptedLog::encrypt(&payload(987, 3), &PublicKey::new(owner.public_key()))
            .unwrap();
        assert_eq!(log.decrypt(&owner).unwrap(), payload(987, 3));
        assert!(log
            .decrypt(&k256::SecretKey::random(&mut OsRng))
            .is_err());
    }
}
