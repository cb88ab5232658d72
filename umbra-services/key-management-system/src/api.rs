use key_management_system_keys::keys::{DecryptingKey, SecuredKey};
use tokio::sync::{mpsc, oneshot};

use crate::{
    backend::{KMSBackend, RegistrationOf},
    AccountMode, KMSMessage,
};

#[derive(thiserror::Error, Debug)]
pub enum KmsApiError<E> {
    #[error("KMS service is unavailable: {0}")]
    Unavailable(&'static str),
    #[error(transparent)]
    Backend(E),
}

type KeyOf<Backend> = <Backend as KMSBackend>::Key;
type ApiResult<T, Backend> = Result<T, KmsApiError<<Backend as KMSBackend>::Error>>;

/// Cloneable handle to a running [`crate::KMSService`].
pub struct KmsServiceApi<Backend>
where
    Backend: KMSBackend,
{
    relay: mpsc::Sender<KMSMessage<Backend>>,
}

impl<Backend> Clone for KmsServiceApi<Backend>
where
    Backend: KMSBackend,
{
    fn clone(&self) -> Self {
        Self {
            relay: self.relay.clone(),
        }
    }
}

impl<Backend> KmsServiceApi<Backend>
where
    Backend: KMSBackend,
{
    #[must_use]
    pub const fn new(relay: mpsc::Sender<KMSMessage<Backend>>) -> Self {
        Self { relay }
    }

    async fn request<T>(
        &self,
        message: KMSMessage<Backend>,
        rx: oneshot::Receiver<Result<T, Backend::Error>>,
        operation: &'static str,
    ) -> ApiResult<T, Backend> {
        self.relay
            .send(message)
            .await
            .map_err(|_| KmsApiError::Unavailable(operation))?;
        rx.await
            .map_err(|_| KmsApiError::Unavailable(operation))?
            .map_err(KmsApiError::Backend)
    }

    pub async fn register(
        &self,
        key_id: Backend::KeyId,
        key: Backend::Key,
        mode: AccountMode,
    ) -> ApiResult<RegistrationOf<Backend>, Backend> {
        let (reply_channel, rx) = oneshot::channel();
        self.request(
            KMSMessage::Register {
                key_id,
                key,
                mode,
                reply_channel,
            },
            rx,
            "register",
        )
        .await
    }

    pub async fn lookup(&self, key_id: Backend::KeyId) -> ApiResult<RegistrationOf<Backend>, Backend> {
        let (reply_channel, rx) = oneshot::channel();
        self.request(
            KMSMessage::Lookup {
                key_id,
                reply_channel,
            },
            rx,
            "lookup",
        )
        .await
    }

    pub async fn registrations(&self) -> ApiResult<Vec<RegistrationOf<Backend>>, Backend> {
        let (reply_channel, rx) = oneshot::channel();
        self.relay
            .send(KMSMessage::Registrations { reply_channel })
            .await
            .map_err(|_| KmsApiError::Unavailable("registrations"))?;
        rx.await
            .map_err(|_| KmsApiError::Unavailable("registrations"))
    }

    pub async fn sign(
        &self,
        key_id: Backend::KeyId,
        payload: <KeyOf<Backend> as SecuredKey>::Payload,
    ) -> ApiResult<<KeyOf<Backend> as SecuredKey>::Signature, Backend> {
        let (reply_channel, rx) = oneshot::channel();
        self.request(
            KMSMessage::Sign {
                key_id,
                payload,
                reply_channel,
            },
            rx,
            "sign",
        )
        .await
    }

    pub async fn try_decrypt(
        &self,
        key_id: Backend::KeyId,
        ciphertext: <KeyOf<Backend> as DecryptingKey>::Ciphertext,
    ) -> ApiResult<Option<<KeyOf<Backend> as DecryptingKey>::Plaintext>, Backend> {
        let (reply_channel, rx) = oneshot::channel();
        self.request(
            KMSMessage::TryDecrypt {
                key_id,
                ciphertext,
                reply_channel,
            },
            rx,
            "try_decrypt",
        )
        .await
    }
}
