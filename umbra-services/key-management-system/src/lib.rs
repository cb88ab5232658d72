pub mod api;
pub mod backend;
pub mod message;
mod registration;

use key_management_system_keys::keys::{DecryptingKey, SecuredKey};
pub use registration::{AccountMode, RegistrationInfo};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info};

pub use crate::{api::KmsServiceApi, message::KMSMessage};
use crate::backend::KMSBackend;

const INBOUND_CAPACITY: usize = 64;

/// Actor owning a [`KMSBackend`].
///
/// Every request goes through its inbox, so concurrent registrations are
/// applied one at a time and the first one for an address wins.
pub struct KMSService<Backend>
where
    Backend: KMSBackend,
{
    backend: Backend,
    inbound_relay: mpsc::Receiver<KMSMessage<Backend>>,
}

impl<Backend> KMSService<Backend>
where
    Backend: KMSBackend + Send + 'static,
    Backend::KeyId: Clone + core::fmt::Debug + Send,
    Backend::Key: Send,
    <Backend::Key as SecuredKey>::Payload: Send,
    <Backend::Key as SecuredKey>::Signature: Send,
    <Backend::Key as SecuredKey>::PublicKey: Send,
    <Backend::Key as DecryptingKey>::Ciphertext: Send,
    <Backend::Key as DecryptingKey>::Plaintext: Send,
    Backend::Error: core::fmt::Display + Send,
{
    /// Starts the service on the current runtime. The task ends once every
    /// [`KmsServiceApi`] handle has been dropped.
    pub fn spawn(
        settings: Backend::Settings,
    ) -> Result<(KmsServiceApi<Backend>, JoinHandle<()>), Backend::Error> {
        let backend = Backend::new(settings)?;
        let (relay, inbound_relay) = mpsc::channel(INBOUND_CAPACITY);
        let service = Self {
            backend,
            inbound_relay,
        };
        let handle = tokio::spawn(service.run());
        Ok((KmsServiceApi::new(relay), handle))
    }

    async fn run(self) {
        let Self {
            mut backend,
            mut inbound_relay,
        } = self;

        info!("KMS service is ready");
        while let Some(msg) = inbound_relay.recv().await {
            Self::handle_kms_message(msg, &mut backend);
        }
        debug!("KMS service stopped, all handles dropped");
    }

    fn handle_kms_message(message: KMSMessage<Backend>, backend: &mut Backend) {
        match message {
            KMSMessage::Register {
                key_id,
                key,
                mode,
                reply_channel,
            } => {
                let result = backend.register(key_id.clone(), key, mode);
                match &result {
                    Ok(_) => debug!(?key_id, %mode, "Registered account"),
                    Err(e) => debug!(?key_id, %mode, "Rejected account registration: {e}"),
                }
                if reply_channel.send(result).is_err() {
                    error!("Could not reply to the register request channel");
                }
            }
            KMSMessage::Lookup {
                key_id,
                reply_channel,
            } => {
                if reply_channel.send(backend.lookup(&key_id)).is_err() {
                    error!("Could not reply to the lookup request channel");
                }
            }
            KMSMessage::Registrations { reply_channel } => {
                if reply_channel.send(backend.registrations()).is_err() {
                    error!("Could not reply to the registrations request channel");
                }
            }
            KMSMessage::Sign {
                key_id,
                payload,
                reply_channel,
            } => {
                if reply_channel.send(backend.sign(&key_id, &payload)).is_err() {
                    error!("Could not reply to the sign request channel");
                }
            }
            KMSMessage::TryDecrypt {
                key_id,
                ciphertext,
                reply_channel,
            } => {
                let result = backend.try_decrypt(&key_id, &ciphertext);
                if reply_channel.send(result).is_err() {
                    error!("Could not reply to the decrypt request channel");
                }
            }
        }
    }
}
