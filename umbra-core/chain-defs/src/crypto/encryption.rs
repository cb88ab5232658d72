use aes_gcm::{aead::Aead as _, Aes256Gcm, Key, KeyInit as _, Nonce};
use k256::{elliptic_curve::point::AffineCoordinates as _, ProjectivePoint};
use rand::{rngs::OsRng, RngCore as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{hash_bytes, PublicKey, KDF_DOMAIN};
use crate::codec::SerdeOp as _;

const NONCE_BYTES: usize = 12;

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("Failed to encrypt payload")]
    Encrypt,
    #[error("Ciphertext is not addressed to this key")]
    Decrypt,
    #[error(transparent)]
    Codec(#[from] crate::codec::Error),
}

/// Payload encrypted to a single public key with an ephemeral ECDH exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext(Vec<u8>);

#[derive(Serialize, Deserialize)]
struct Envelope {
    ephemeral_pk: PublicKey,
    nonce: [u8; NONCE_BYTES],
    cipher: Vec<u8>,
}

impl Ciphertext {
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn encrypt(plaintext: &[u8], receiver: &PublicKey) -> Result<Self, EncryptionError> {
        let ephemeral = k256::SecretKey::random(&mut OsRng);
        let key = shared_key(receiver, &ephemeral);

        let mut nonce = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut nonce);

        let cipher = Aes256Gcm::new(&key)
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| EncryptionError::Encrypt)?;

        let envelope = Envelope {
            ephemeral_pk: PublicKey::new(ephemeral.public_key()),
            nonce,
            cipher,
        };
        Ok(Self(envelope.to_bytes()?.to_vec()))
    }

    pub fn decrypt(&self, secret: &k256::SecretKey) -> Result<Vec<u8>, EncryptionError> {
        let envelope = Envelope::from_bytes(&self.0)?;
        let key = shared_key(&envelope.ephemeral_pk, secret);
        Aes256Gcm::new(&key)
            .decrypt(Nonce::from_slice(&envelope.nonce), envelope.cipher.as_ref())
            .map_err(|_| EncryptionError::Decrypt)
    }
}

// Only the x-coordinate of the shared point feeds the KDF, so a receiver key
// rebuilt from an address with the opposite y parity derives the same key.
fn shared_key(public: &PublicKey, secret: &k256::SecretKey) -> Key<Aes256Gcm> {
    let shared = (ProjectivePoint::from(*public.as_inner().as_affine())
        * *secret.to_nonzero_scalar())
    .to_affine();
    let digest = hash_bytes(KDF_DOMAIN, &[shared.x().as_slice()]);
    *Key::<Aes256Gcm>::from_slice(&digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_receiver_decrypts() {
        let receiver = k256::SecretKey::random(&mut OsRng);
        let other = k256::SecretKey::random(&mut OsRng);
        let ciphertext =
            Ciphertext::encrypt(b"balance note", &PublicKey::new(receiver.public_key()))
                .unwrap();

        assert_eq!(ciphertext.decrypt(&receiver).unwrap(), b"balance note");
        assert!(matches!(
            ciphertext.decrypt(&other),
            Err(EncryptionError::Decrypt)
        ));
    }

    #[test]
    fn negated_receiver_key_still_decrypts() {
        let receiver = k256::SecretKey::random(&mut OsRng);
        let public = PublicKey::new(receiver.public_key());
        let mut flipped = public.to_compressed();
        flipped[0] ^= 0x01;
        let flipped = PublicKey::from_sec1_bytes(&flipped).unwrap();

        let ciphertext = Ciphertext::encrypt(b"note", &flipped).unwrap();
        assert_eq!(ciphertext.decrypt(&receiver).unwrap(), b"note");
    }

    #[test]
    fn garbage_is_a_codec_error() {
        let receiver = k256::SecretKey::random(&mut OsRng);
        assert!(matches!(
            Ciphertext::from_bytes(vec![1, 2, 3]).decrypt(&receiver),
            Err(EncryptionError::Codec(_))
        ));
    }
}
