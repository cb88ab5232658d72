use core::fmt::{self, Debug, Formatter};

use k256::{
    ecdsa::{signature::Signer as _, SigningKey},
    elliptic_curve::rand_core::CryptoRngCore,
    FieldBytes,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use umbra_core::{
    crypto::{Fr, KeyError as CryptoKeyError, PublicKey, Signature},
    logs::{EncryptedLog, NotePayload},
    Address,
};
use zeroize::ZeroizeOnDrop;

use crate::keys::{
    errors::KeyError,
    secured_key::{DecryptingKey, SecuredKey},
};

pub const ACCOUNT_SECRET_KEY_SIZE: usize = 32;

/// A secp256k1 account secret exposing its inner value.
///
/// To be used where a KMS-like key is required but going through the KMS
/// roundtrip is not possible, e.g. when generating keys in tests.
#[derive(ZeroizeOnDrop, Clone, PartialEq, Eq)]
pub struct UnsecuredAccountKey(k256::SecretKey);

impl UnsecuredAccountKey {
    pub fn from_bytes(bytes: &[u8; ACCOUNT_SECRET_KEY_SIZE]) -> Result<Self, KeyError> {
        k256::SecretKey::from_bytes(&FieldBytes::from(*bytes))
            .map(Self)
            .map_err(|_| CryptoKeyError::InvalidPrivateKey.into())
    }

    pub fn generate<Rng>(rng: &mut Rng) -> Self
    where
        Rng: CryptoRngCore,
    {
        Self(k256::SecretKey::random(rng))
    }

    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey::new(self.0.public_key())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; ACCOUNT_SECRET_KEY_SIZE] {
        self.0.to_bytes().into()
    }

    #[must_use]
    pub const fn as_secret(&self) -> &k256::SecretKey {
        &self.0
    }
}

impl Debug for UnsecuredAccountKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "UnsecuredAccountKey({})", self.public_key().x())
    }
}

impl Serialize for UnsecuredAccountKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        const_hex::encode(self.to_bytes()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UnsecuredAccountKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <String>::deserialize(deserializer)?;
        let bytes: [u8; ACCOUNT_SECRET_KEY_SIZE] =
            const_hex::decode_to_array(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// A hardened account key that only exposes public information, signatures
/// and decryptions.
#[derive(Deserialize, ZeroizeOnDrop, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "unsafe", derive(Serialize))]
pub struct AccountKey(UnsecuredAccountKey);

impl AccountKey {
    pub fn from_bytes(bytes: &[u8; ACCOUNT_SECRET_KEY_SIZE]) -> Result<Self, KeyError> {
        UnsecuredAccountKey::from_bytes(bytes).map(Self)
    }

    pub fn generate<Rng>(rng: &mut Rng) -> Self
    where
        Rng: CryptoRngCore,
    {
        Self(UnsecuredAccountKey::generate(rng))
    }

    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.0.public_key()
    }

    /// Address of the account when it has no contract of its own.
    #[must_use]
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }
}

impl From<UnsecuredAccountKey> for AccountKey {
    fn from(value: UnsecuredAccountKey) -> Self {
        Self(value)
    }
}

impl Debug for AccountKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        #[cfg(feature = "unsafe")]
        write!(f, "AccountKey({:?})", self.0)?;

        #[cfg(not(feature = "unsafe"))]
        write!(f, "AccountKey(<redacted>)")?;

        Ok(())
    }
}

impl SecuredKey for AccountKey {
    type Payload = Fr;
    type Signature = Signature;
    type PublicKey = PublicKey;
    type Error = KeyError;

    fn sign(&self, payload: &Self::Payload) -> Result<Self::Signature, Self::Error> {
        let signature: k256::ecdsa::Signature =
            SigningKey::from(self.0.as_secret()).sign(payload.as_bytes());
        Ok(signature.into())
    }

    fn as_public_key(&self) -> Self::PublicKey {
        self.public_key()
    }
}

impl DecryptingKey for AccountKey {
    type Ciphertext = EncryptedLog;
    type Plaintext = NotePayload;

    fn decrypt(&self, ciphertext: &Self::Ciphertext) -> Result<Self::Plaintext, Self::Error> {
        Ok(ciphertext.decrypt(self.0.as_secret())?)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;
    use umbra_core::{crypto::derive_public_key, logs::Note};

    use super::*;

    #[test]
    fn signatures_verify_against_the_public_key() {
        let key = AccountKey::generate(&mut OsRng);
        let payload = Fr::from(42u64);
        let signature = key.sign(&payload).unwrap();
        assert!(key
            .as_public_key()
            .verify(payload.as_bytes(), &signature)
            .is_ok());
    }

    #[test]
    fn derived_public_key_matches() {
        let key = UnsecuredAccountKey::generate(&mut OsRng);
        assert_eq!(derive_public_key(&key.to_bytes()).unwrap(), key.public_key());
    }

    #[test]
    fn decrypts_logs_sent_to_its_address() {
        let key = AccountKey::generate(&mut OsRng);
        let payload = NotePayload {
            contract: Address::ZERO,
            storage_slot: Fr::ONE,
            note: Note::new(vec![Fr::from(5u64)], Fr::from(6u64)),
        };
        let receiver = key.address().to_public_key().unwrap();
        let log = EncryptedLog::encrypt(&payload, &receiver).unwrap();
        assert_eq!(key.decrypt(&log).unwrap(), payload);
    }

    #[cfg(not(feature = "unsafe"))]
    #[test]
    fn debug_output_is_redacted() {
        let key = AccountKey::generate(&mut OsRng);
        assert_eq!(format!("{key:?}"), "AccountKey(<redacted>)");
    }

    #[test]
    fn deserializes_from_hex() {
        let unsecured = UnsecuredAccountKey::generate(&mut OsRng);
        let json = serde_json::to_string(&unsecured).unwrap();
        let key: AccountKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key.public_key(), unsecured.public_key());
    }
}
