#[cfg(feature = "preload")]
pub mod preload;

use key_management_system_keys::keys::{DecryptingKey, SecuredKey};

use crate::{AccountMode, RegistrationInfo};

pub type RegistrationOf<Backend> = RegistrationInfo<
    <Backend as KMSBackend>::KeyId,
    <<Backend as KMSBackend>::Key as SecuredKey>::PublicKey,
>;

/// Storage of account keys. Keys never leave the backend: callers get
/// signatures and decryptions back.
pub trait KMSBackend {
    type KeyId;
    type Key: DecryptingKey;
    type Settings;
    type Error;

    fn new(settings: Self::Settings) -> Result<Self, Self::Error>
    where
        Self: Sized;

    /// Binds `key` to `key_id`. Registering the same key with the same mode
    /// again is a no-op; anything else for a known id is a conflict.
    fn register(
        &mut self,
        key_id: Self::KeyId,
        key: Self::Key,
        mode: AccountMode,
    ) -> Result<RegistrationOf<Self>, Self::Error>;

    fn lookup(&self, key_id: &Self::KeyId) -> Result<RegistrationOf<Self>, Self::Error>;

    fn registrations(&self) -> Vec<RegistrationOf<Self>>;

    fn sign(
        &self,
        key_id: &Self::KeyId,
        payload: &<Self::Key as SecuredKey>::Payload,
    ) -> Result<<Self::Key as SecuredKey>::Signature, Self::Error>;

    /// `Ok(None)` when the ciphertext is not addressed to the key.
    fn try_decrypt(
        &self,
        key_id: &Self::KeyId,
        ciphertext: &<Self::Key as DecryptingKey>::Ciphertext,
    ) -> Result<Option<<Self::Key as DecryptingKey>::Plaintext>, Self::Error>;
}
