macro_rules! display_hex_bytes_newtype {
    ($newtype:ty) => {
        impl core::fmt::Display for $newtype {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "0x")?;
                for v in self.as_ref() {
                    write!(f, "{:02x}", v)?;
                }
                Ok(())
            }
        }
    };
}

/// Hex in human readable formats, raw bytes otherwise.
///
/// Deserialization goes through `TryFrom<[u8; $len]>` so newtypes with an
/// invariant (e.g. canonical field elements) can reject bad input.
macro_rules! serde_bytes_newtype {
    ($newtype:ty, $len:expr) => {
        impl serde::Serialize for $newtype {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                let bytes: &[u8; $len] = self.as_ref();
                if serializer.is_human_readable() {
                    const_hex::const_encode::<$len, false>(bytes)
                        .as_str()
                        .serialize(serializer)
                } else {
                    bytes.serialize(serializer)
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for $newtype {
            fn deserialize<D>(deserializer: D) -> Result<$newtype, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let bytes = if deserializer.is_human_readable() {
                    let s = <String>::deserialize(deserializer)?;
                    const_hex::decode_to_array::<_, $len>(s).map_err(serde::de::Error::custom)?
                } else {
                    <[u8; $len]>::deserialize(deserializer)?
                };
                <$newtype>::try_from(bytes).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use display_hex_bytes_newtype;
pub(crate) use serde_bytes_newtype;
