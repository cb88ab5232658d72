use k256::{
    ecdsa::{signature::Verifier as _, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint as _,
    FieldBytes,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{serde_as, Bytes, DeserializeAs as _, SerializeAs as _};
use thiserror::Error;

use super::Fr;

pub const COMPRESSED_PUBLIC_KEY_BYTES: usize = 33;
pub const SIGNATURE_BYTES: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key encoding")]
    InvalidPublicKey,
    #[error("Invalid signature encoding")]
    InvalidSignature,
    #[error("Signature does not verify")]
    VerificationFailed,
}

/// Account public key on secp256k1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey(k256::PublicKey);

impl PublicKey {
    #[must_use]
    pub const fn new(key: k256::PublicKey) -> Self {
        Self(key)
    }

    #[must_use]
    pub const fn as_inner(&self) -> &k256::PublicKey {
        &self.0
    }

    #[must_use]
    pub fn to_compressed(&self) -> [u8; COMPRESSED_PUBLIC_KEY_BYTES] {
        let encoded = self.0.to_encoded_point(true);
        let mut bytes = [0u8; COMPRESSED_PUBLIC_KEY_BYTES];
        bytes.copy_from_slice(encoded.as_bytes());
        bytes
    }

    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        k256::PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| KeyError::InvalidPublicKey)
    }

    /// Rebuilds a key from its affine coordinates, as carried in packed
    /// arguments.
    pub fn from_fields(x: &Fr, y: &Fr) -> Result<Self, KeyError> {
        let mut bytes = [0u8; 65];
        bytes[0] = 0x04;
        bytes[1..33].copy_from_slice(x.as_bytes());
        bytes[33..].copy_from_slice(y.as_bytes());
        Self::from_sec1_bytes(&bytes)
    }

    #[must_use]
    pub fn x(&self) -> Fr {
        self.coordinates().0
    }

    #[must_use]
    pub fn y(&self) -> Fr {
        self.coordinates().1
    }

    #[must_use]
    pub fn coordinates(&self) -> (Fr, Fr) {
        let encoded = self.0.to_encoded_point(false);
        let coordinate = |bytes: Option<&FieldBytes>| {
            let bytes: [u8; 32] = bytes
                .expect("uncompressed points carry both coordinates")
                .as_slice()
                .try_into()
                .expect("coordinates are 32 bytes");
            Fr::try_from_bytes(bytes).expect("affine coordinates are base field elements")
        };
        (coordinate(encoded.x()), coordinate(encoded.y()))
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), KeyError> {
        let signature = k256::ecdsa::Signature::from_slice(&signature.0)
            .map_err(|_| KeyError::InvalidSignature)?;
        VerifyingKey::from(&self.0)
            .verify(message, &signature)
            .map_err(|_| KeyError::VerificationFailed)
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = self.to_compressed();
        if serializer.is_human_readable() {
            const_hex::encode(bytes).serialize(serializer)
        } else {
            Bytes::serialize_as(&bytes, serializer)
        }
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: [u8; COMPRESSED_PUBLIC_KEY_BYTES] = if deserializer.is_human_readable() {
            let s = <String>::deserialize(deserializer)?;
            const_hex::decode_to_array(s).map_err(serde::de::Error::custom)?
        } else {
            Bytes::deserialize_as(deserializer)?
        };
        Self::from_sec1_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Compact ECDSA signature, `r || s`.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde_as(as = "Bytes")] [u8; SIGNATURE_BYTES]);

impl Signature {
    #[must_use]
    pub const fn new(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_BYTES] {
        &self.0
    }
}

impl From<k256::ecdsa::Signature> for Signature {
    fn from(signature: k256::ecdsa::Signature) -> Self {
        let mut bytes = [0u8; SIGNATURE_BYTES];
        bytes.copy_from_slice(&signature.to_bytes());
        Self(bytes)
    }
}

pub fn derive_public_key(private_key: &[u8; 32]) -> Result<PublicKey, KeyError> {
    k256::SecretKey::from_bytes(&FieldBytes::from(*private_key))
        .map(|secret| PublicKey(secret.public_key()))
        .map_err(|_| KeyError::InvalidPrivateKey)
}

#[cfg(test)]
mod tests {
    use k256::ecdsa::{signature::Signer as _, SigningKey};
    use rand::rngs::OsRng;

    use super::*;

    #[test]
    fn coordinates_rebuild_the_key() {
        let secret = k256::SecretKey::random(&mut OsRng);
        let public = PublicKey::new(secret.public_key());
        let (x, y) = public.coordinates();
        assert_eq!(PublicKey::from_fields(&x, &y).unwrap(), public);
        assert_eq!(
            derive_public_key(&secret.to_bytes().into()).unwrap(),
            public
        );
    }

    #[test]
    fn zero_is_not_a_private_key() {
        assert_eq!(
            derive_public_key(&[0u8; 32]),
            Err(KeyError::InvalidPrivateKey)
        );
    }

    #[test]
    fn signatures_verify_only_for_the_signed_message() {
        let signing_key = SigningKey::random(&mut OsRng);
        let public = PublicKey::new(signing_key.verifying_key().into());
        let signature: k256::ecdsa::Signature = signing_key.sign(b"message");
        let signature = Signature::from(signature);

        assert!(public.verify(b"message", &signature).is_ok());
        assert_eq!(
            public.verify(b"other message", &signature),
            Err(KeyError::VerificationFailed)
        );
    }

    #[test]
    fn serde_uses_compressed_points() {
        let public = PublicKey::new(k256::SecretKey::random(&mut OsRng).public_key());
        let json = serde_json::to_string(&public).unwrap();
        assert_eq!(json.len(), 2 + 2 * COMPRESSED_PUBLIC_KEY_BYTES);
        assert_eq!(serde_json::from_str::<PublicKey>(&json).unwrap(), public);
    }
}
