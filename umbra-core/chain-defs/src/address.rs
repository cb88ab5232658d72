use serde::{Deserialize, Serialize};

use crate::crypto::{Fr, KeyError, PublicKey};

/// Identity of an account or a contract.
///
/// Accounts without a contract are addressed by the x-coordinate of their
/// public key, contracts by the hash of their deployment data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(Fr);

impl Address {
    pub const ZERO: Self = Self(Fr::ZERO);

    #[must_use]
    pub const fn new(fr: Fr) -> Self {
        Self(fr)
    }

    #[must_use]
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(public_key.x())
    }

    /// Recovers a public key for this address, choosing the even y
    /// coordinate. Good enough for encrypting to the account, since only the
    /// x-coordinate of the shared secret is used.
    pub fn to_public_key(&self) -> Result<PublicKey, KeyError> {
        let mut bytes = [0u8; 33];
        bytes[0] = 0x02;
        bytes[1..].copy_from_slice(self.0.as_bytes());
        PublicKey::from_sec1_bytes(&bytes)
    }

    #[must_use]
    pub const fn to_field(&self) -> Fr {
        self.0
    }
}

impl From<Fr> for Address {
    fn from(fr: Fr) -> Self {
        Self(fr)
    }
}

impl From<Address> for Fr {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;

    #[test]
    fn address_round_trips_to_an_x_only_key() {
        let public = PublicKey::new(k256::SecretKey::random(&mut OsRng).public_key());
        let address = Address::from_public_key(&public);
        let recovered = address.to_public_key().unwrap();
        assert_eq!(recovered.x(), public.x());
        assert_eq!(Address::from_public_key(&recovered), address);
    }
}
