use key_management_system_keys::keys::{DecryptingKey, SecuredKey};
use tokio::sync::oneshot;

use crate::backend::{KMSBackend, RegistrationOf};

type KeyOf<Backend> = <Backend as KMSBackend>::Key;
type Reply<T, Backend> = oneshot::Sender<Result<T, <Backend as KMSBackend>::Error>>;

pub enum KMSMessage<Backend>
where
    Backend: KMSBackend,
{
    Register {
        key_id: Backend::KeyId,
        key: Backend::Key,
        mode: crate::AccountMode,
        reply_channel: Reply<RegistrationOf<Backend>, Backend>,
    },
    Lookup {
        key_id: Backend::KeyId,
        reply_channel: Reply<RegistrationOf<Backend>, Backend>,
    },
    Registrations {
        reply_channel: oneshot::Sender<Vec<RegistrationOf<Backend>>>,
    },
    Sign {
        key_id: Backend::KeyId,
        payload: <KeyOf<Backend> as SecuredKey>::Payload,
        reply_channel: Reply<<KeyOf<Backend> as SecuredKey>::Signature, Backend>,
    },
    TryDecrypt {
        key_id: Backend::KeyId,
        ciphertext: <KeyOf<Backend> as DecryptingKey>::Ciphertext,
        reply_channel: Reply<Option<<KeyOf<Backend> as DecryptingKey>::Plaintext>, Backend>,
    },
}
