//! Serializer for wire formats and content hashing.
mod bincode;
pub mod errors;
use std::error::Error as StdError;

use bytes::Bytes;
pub use errors::Error;
use serde::{de::DeserializeOwned, Serialize};
pub type Result<T> = std::result::Result<T, Error>;

/// Unified serialization trait for wire payloads, encrypted log plaintexts
/// and anything hashed by value.
pub trait SerdeOp: Serialize {
    type Error: StdError;

    fn to_bytes(&self) -> Result<Bytes>;

    fn from_bytes(data: &[u8]) -> Result<Self>
    where
        Self: DeserializeOwned;
}

impl<S: Serialize> SerdeOp for S {
    type Error = Error;

    fn to_bytes(&self) -> Result<Bytes> {
        bincode::serialize(self)
    }

    fn from_bytes(data: &[u8]) -> Result<Self>
    where
        Self: DeserializeOwned,
    {
        bincode::deserialize(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fr;

    #[test]
    fn serialize_deserialize() {
        let fields = vec![Fr::from(1u64), Fr::from(987u64)];
        let serialized = fields.to_bytes().unwrap();
        let deserialized: Vec<Fr> = Vec::from_bytes(&serialized).unwrap();
        assert_eq!(fields, deserialized);
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut serialized = Fr::ONE.to_bytes().unwrap().to_vec();
        serialized.push(0);
        assert!(Fr::from_bytes(&serialized).is_err());
    }
}
