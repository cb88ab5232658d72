mod encryption;
mod field;
mod keys;

use blake2::{digest::consts::U32, Blake2b};
pub use blake2::Digest;
pub use encryption::{Ciphertext, EncryptionError};
pub use field::{FieldError, Fr, FR_BYTES};
pub use keys::{derive_public_key, KeyError, PublicKey, Signature, SIGNATURE_BYTES};

pub type Hasher = Blake2b<U32>;

pub const ARGS_DOMAIN: &[u8] = b"UMBRA_ARGS_V1";
pub const TX_DOMAIN: &[u8] = b"UMBRA_TX_V1";
pub const NOTE_DOMAIN: &[u8] = b"UMBRA_NOTE_V1";
pub const NULLIFIER_DOMAIN: &[u8] = b"UMBRA_NULLIFIER_V1";
pub const CONTRACT_ADDRESS_DOMAIN: &[u8] = b"UMBRA_CONTRACT_ADDR_V1";
pub const KDF_DOMAIN: &[u8] = b"UMBRA_KDF_V1";
pub const SELECTOR_DOMAIN: &[u8] = b"UMBRA_SELECTOR_V1";
pub const BLOCK_DOMAIN: &[u8] = b"UMBRA_BLOCK_V1";

#[must_use]
pub fn hash_bytes(domain: &[u8], chunks: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(domain);
    for chunk in chunks {
        hasher.update(chunk);
    }
    hasher.finalize().into()
}

/// Domain separated hash of a sequence of field elements, mapped back into the
/// field.
#[must_use]
pub fn hash_fields(domain: &[u8], fields: &[Fr]) -> Fr {
    let mut hasher = Hasher::new();
    hasher.update(domain);
    for fr in fields {
        hasher.update(fr.as_bytes());
    }
    Fr::from_digest(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains_separate_hashes() {
        let fields = [Fr::from(1u64), Fr::from(2u64)];
        assert_ne!(
            hash_fields(NOTE_DOMAIN, &fields),
            hash_fields(NULLIFIER_DOMAIN, &fields)
        );
        assert_eq!(
            hash_fields(NOTE_DOMAIN, &fields),
            hash_fields(NOTE_DOMAIN, &fields)
        );
    }
}
