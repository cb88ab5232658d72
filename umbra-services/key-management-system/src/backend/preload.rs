//! In-memory [`KMSBackend`] holding account keys, optionally preloaded from
//! settings.
use std::collections::HashMap;

use key_management_system_keys::keys::{AccountKey, DecryptingKey as _, KeyError, SecuredKey as _};
use serde::Deserialize;
use umbra_core::{
    crypto::{EncryptionError, Fr, PublicKey, Signature},
    logs::{EncryptedLog, NotePayload},
    Address,
};

use crate::{backend::KMSBackend, AccountMode, RegistrationInfo};

#[derive(thiserror::Error, Debug)]
pub enum PreloadBackendError {
    #[error("Account {0} is not registered")]
    KeyNotRegistered(Address),
    #[error("Account {address} is already registered as {existing}, cannot register it as {requested}")]
    ConflictingRegistration {
        address: Address,
        existing: AccountMode,
        requested: AccountMode,
    },
    #[error("Account {0} is already registered with a different key")]
    ConflictingKey(Address),
    #[error("Signing account {address} must be addressed by its key, expected {derived}")]
    AddressMismatch { address: Address, derived: Address },
    #[error(transparent)]
    Key(#[from] KeyError),
}

struct Registered {
    key: AccountKey,
    mode: AccountMode,
}

pub struct PreloadKMSBackend {
    accounts: HashMap<Address, Registered>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PreloadedAccount {
    /// Defaults to the address derived from the key.
    #[serde(default)]
    pub address: Option<Address>,
    pub key: AccountKey,
    pub mode: AccountMode,
}

/// All accounts to be loaded into the [`PreloadKMSBackend`] at start-up.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct PreloadKMSBackendSettings {
    #[serde(default)]
    pub accounts: Vec<PreloadedAccount>,
}

impl PreloadKMSBackend {
    fn info(address: Address, registered: &Registered) -> RegistrationInfo<Address, PublicKey> {
        RegistrationInfo {
            key_id: address,
            public_key: registered.key.as_public_key(),
            mode: registered.mode,
        }
    }

    fn get(&self, address: &Address) -> Result<&Registered, PreloadBackendError> {
        self.accounts
            .get(address)
            .ok_or(PreloadBackendError::KeyNotRegistered(*address))
    }
}

impl KMSBackend for PreloadKMSBackend {
    type KeyId = Address;
    type Key = AccountKey;
    type Settings = PreloadKMSBackendSettings;
    type Error = PreloadBackendError;

    /// Preloaded accounts go through [`KMSBackend::register`] in order, so a
    /// bad or conflicting entry fails the whole load.
    fn new(settings: Self::Settings) -> Result<Self, Self::Error> {
        let mut backend = Self {
            accounts: HashMap::new(),
        };
        for account in settings.accounts {
            let address = account.address.unwrap_or_else(|| account.key.address());
            backend.register(address, account.key, account.mode)?;
        }
        Ok(backend)
    }

    fn register(
        &mut self,
        key_id: Self::KeyId,
        key: Self::Key,
        mode: AccountMode,
    ) -> Result<RegistrationInfo<Address, PublicKey>, Self::Error> {
        if mode == AccountMode::Signing && key.address() != key_id {
            return Err(PreloadBackendError::AddressMismatch {
                address: key_id,
                derived: key.address(),
            });
        }
        if let Some(existing) = self.accounts.get(&key_id) {
            if existing.mode != mode {
                return Err(PreloadBackendError::ConflictingRegistration {
                    address: key_id,
                    existing: existing.mode,
                    requested: mode,
                });
            }
            if existing.key != key {
                return Err(PreloadBackendError::ConflictingKey(key_id));
            }
            return Ok(Self::info(key_id, existing));
        }
        let registered = Registered { key, mode };
        let info = Self::info(key_id, &registered);
        self.accounts.insert(key_id, registered);
        Ok(info)
    }

    fn lookup(&self, key_id: &Self::KeyId) -> Result<RegistrationInfo<Address, PublicKey>, Self::Error> {
        self.get(key_id).map(|registered| Self::info(*key_id, registered))
    }

    fn registrations(&self) -> Vec<RegistrationInfo<Address, PublicKey>> {
        let mut registrations: Vec<_> = self
            .accounts
            .iter()
            .map(|(address, registered)| Self::info(*address, registered))
            .collect();
        registrations.sort_by_key(|info| info.key_id);
        registrations
    }

    fn sign(&self, key_id: &Self::KeyId, payload: &Fr) -> Result<Signature, Self::Error> {
        let registered = self.get(key_id)?;
        Ok(registered.key.sign(payload)?)
    }

    fn try_decrypt(
        &self,
        key_id: &Self::KeyId,
        ciphertext: &EncryptedLog,
    ) -> Result<Option<NotePayload>, Self::Error> {
        match self.get(key_id)?.key.decrypt(ciphertext) {
            Ok(payload) => Ok(Some(payload)),
            Err(KeyError::Decryption(EncryptionError::Decrypt)) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}
