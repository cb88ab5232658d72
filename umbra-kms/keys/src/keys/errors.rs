use thiserror::Error;
use umbra_core::crypto::{EncryptionError, KeyError as CryptoKeyError};

#[derive(Error, Debug)]
pub enum KeyError {
    #[error(transparent)]
    Invalid(#[from] CryptoKeyError),
    #[error(transparent)]
    Decryption(#[from] EncryptionError),
}
