use bincode::Options as _;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

use super::{Error, Result};

// Fixed-width integers and no trailing bytes, so that encodings are canonical
// and can be hashed.
fn options() -> impl bincode::Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
        .reject_trailing_bytes()
}

pub(super) fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    options()
        .serialize(value)
        .map(Bytes::from)
        .map_err(Error::Serialize)
}

pub(super) fn deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    options().deserialize(data).map_err(Error::Deserialize)
}
