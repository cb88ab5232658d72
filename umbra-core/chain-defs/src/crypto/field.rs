use k256::{FieldBytes, FieldElement};
use rand::RngCore;
use thiserror::Error;

use crate::utils::{display_hex_bytes_newtype, serde_bytes_newtype};

pub const FR_BYTES: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Value is not a canonical field element")]
    NonCanonical,
}

/// Element of the circuit field, stored as 32 big-endian bytes.
///
/// Construction always checks canonicity, so every `Fr` in memory is a valid
/// element of the secp256k1 base field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fr([u8; FR_BYTES]);

impl Fr {
    pub const ZERO: Self = Self([0; FR_BYTES]);
    pub const ONE: Self = Self::from_u64(1);

    pub fn try_from_bytes(bytes: [u8; FR_BYTES]) -> Result<Self, FieldError> {
        Option::<FieldElement>::from(FieldElement::from_bytes(&FieldBytes::from(bytes)))
            .map(|_| Self(bytes))
            .ok_or(FieldError::NonCanonical)
    }

    /// Maps a 32 byte digest into the field by dropping its most significant
    /// byte. The result is below 2^248 and therefore always canonical.
    #[must_use]
    pub const fn from_digest(mut digest: [u8; FR_BYTES]) -> Self {
        digest[0] = 0;
        Self(digest)
    }

    /// Uniformly random element below 2^248.
    pub fn random(rng: &mut (impl RngCore + ?Sized)) -> Self {
        let mut bytes = [0u8; FR_BYTES];
        rng.fill_bytes(&mut bytes);
        Self::from_digest(bytes)
    }

    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; FR_BYTES];
        let be = value.to_be_bytes();
        let mut i = 0;
        while i < be.len() {
            bytes[FR_BYTES - be.len() + i] = be[i];
            i += 1;
        }
        Self(bytes)
    }

    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; FR_BYTES];
        let be = value.to_be_bytes();
        let mut i = 0;
        while i < be.len() {
            bytes[FR_BYTES - be.len() + i] = be[i];
            i += 1;
        }
        Self(bytes)
    }

    #[must_use]
    pub fn to_u128(&self) -> Option<u128> {
        let (high, low) = self.0.split_at(FR_BYTES - 16);
        if high.iter().any(|byte| *byte != 0) {
            return None;
        }
        low.try_into().ok().map(u128::from_be_bytes)
    }

    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        self.to_u128().and_then(|value| u64::try_from(value).ok())
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FR_BYTES] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl AsRef<[u8; FR_BYTES]> for Fr {
    fn as_ref(&self) -> &[u8; FR_BYTES] {
        &self.0
    }
}

impl TryFrom<[u8; FR_BYTES]> for Fr {
    type Error = FieldError;

    fn try_from(bytes: [u8; FR_BYTES]) -> Result<Self, Self::Error> {
        Self::try_from_bytes(bytes)
    }
}

impl From<u64> for Fr {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<u128> for Fr {
    fn from(value: u128) -> Self {
        Self::from_u128(value)
    }
}

impl From<bool> for Fr {
    fn from(value: bool) -> Self {
        Self::from_u64(u64::from(value))
    }
}

display_hex_bytes_newtype!(Fr);
serde_bytes_newtype!(Fr, FR_BYTES);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_round_trip_through_the_field() {
        assert_eq!(Fr::from(987u64).to_u128(), Some(987));
        assert_eq!(Fr::from(u128::MAX).to_u128(), Some(u128::MAX));
        assert_eq!(Fr::from(u128::MAX).to_u64(), None);
        assert_eq!(Fr::from(true), Fr::ONE);
    }

    #[test]
    fn rejects_values_above_the_modulus() {
        assert_eq!(
            Fr::try_from_bytes([0xff; FR_BYTES]),
            Err(FieldError::NonCanonical)
        );
        let mut below = [0xff; FR_BYTES];
        below[0] = 0x7f;
        assert!(Fr::try_from_bytes(below).is_ok());
    }

    #[test]
    fn digests_are_always_canonical() {
        let fr = Fr::from_digest([0xff; FR_BYTES]);
        assert_eq!(fr.as_bytes()[0], 0);
        assert!(Fr::try_from_bytes(*fr.as_bytes()).is_ok());
    }

    #[test]
    fn serde_rejects_non_canonical_hex() {
        let json = format!("\"{}\"", "ff".repeat(FR_BYTES));
        assert!(serde_json::from_str::<Fr>(&json).is_err());

        let fr = Fr::from(42u64);
        let json = serde_json::to_string(&fr).unwrap();
        assert_eq!(serde_json::from_str::<Fr>(&json).unwrap(), fr);
    }
}
