pub mod auth;
pub mod config;
pub mod contracts;
mod deploy;
pub mod error;
mod notes;
mod sync;
pub mod tx;

use std::sync::{Arc, Mutex};

use key_management_system::{
    api::KmsApiError,
    backend::preload::{PreloadBackendError, PreloadKMSBackend, PreloadKMSBackendSettings},
    KMSService, KmsServiceApi,
};
pub use key_management_system::{AccountMode, RegistrationInfo};
use key_management_system_keys::keys::AccountKey;
use rand::rngs::OsRng;
use tokio::sync::oneshot;
use tracing::info;
use umbra_core::{
    crypto::PublicKey,
    logs::NotePayload,
    tx::{ExecutionDescriptor, TxContext, TxExecutionRequest},
    Address,
};
use umbra_node::NodeApi;
use umbra_utils::retry::{retry_until, RetryError, RetryPolicy};

pub use crate::{
    auth::Authenticator,
    config::{WaitOpts, WalletConfig},
    deploy::deployment_request,
    error::{AuthenticationError, WalletError},
    notes::NoteStore,
    tx::{DeploySentTx, SentTx, TxLifecycle},
};
use crate::sync::{run_synchronizer, Synchronizer};

pub type Kms = KmsServiceApi<PreloadKMSBackend>;

/// Accounts, request authentication and private state of one user.
///
/// Cheap to clone. The background synchronizer stops once every handle is
/// dropped or [`Wallet::stop`] is called.
#[derive(Clone)]
pub struct Wallet {
    inner: Arc<WalletInner>,
}

struct WalletInner {
    node: Arc<dyn NodeApi>,
    kms: Kms,
    config: WalletConfig,
    synchronizer: Arc<Synchronizer>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl WalletInner {
    fn signal_shutdown(&self) {
        if let Some(shutdown) = self.shutdown.lock().ok().and_then(|mut s| s.take()) {
            let _ = shutdown.send(());
        }
    }
}

impl Drop for WalletInner {
    fn drop(&mut self) {
        self.signal_shutdown();
    }
}

impl Wallet {
    /// Starts a wallet with an empty key store. Must be called from within a
    /// tokio runtime.
    #[must_use]
    pub fn spawn(node: Arc<dyn NodeApi>, config: WalletConfig) -> Self {
        let (kms, _) = KMSService::<PreloadKMSBackend>::spawn(PreloadKMSBackendSettings::default())
            .expect("an empty key store always loads");
        Self::with_kms(node, kms, config)
    }

    #[must_use]
    pub fn with_kms(node: Arc<dyn NodeApi>, kms: Kms, config: WalletConfig) -> Self {
        let synchronizer = Arc::new(Synchronizer::new(
            Arc::clone(&node),
            kms.clone(),
            config.sync_batch,
        ));
        let (shutdown, shutdown_rx) = oneshot::channel();
        tokio::spawn(run_synchronizer(
            Arc::clone(&synchronizer),
            config.sync_poll_interval,
            shutdown_rx,
        ));
        Self {
            inner: Arc::new(WalletInner {
                node,
                kms,
                config,
                synchronizer,
                shutdown: Mutex::new(Some(shutdown)),
            }),
        }
    }

    #[must_use]
    pub fn node(&self) -> &Arc<dyn NodeApi> {
        &self.inner.node
    }

    #[must_use]
    pub fn kms(&self) -> &Kms {
        &self.inner.kms
    }

    #[must_use]
    pub fn config(&self) -> &WalletConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn tx_context(&self) -> TxContext {
        TxContext::new(self.inner.config.chain_id, self.inner.config.version)
    }

    /// Registers `key` for `address`. Registering the same key and mode again
    /// is a no-op; anything else for a known address is a conflict.
    pub async fn register_account(
        &self,
        address: Address,
        key: AccountKey,
        mode: AccountMode,
    ) -> Result<RegistrationInfo<Address, PublicKey>, WalletError> {
        let registration = self.inner.kms.register(address, key, mode).await?;
        info!(%address, %mode, "Registered account");
        Ok(registration)
    }

    /// Generates a key and registers it under its own address.
    pub async fn create_account(&self, mode: AccountMode) -> Result<Address, WalletError> {
        let key = AccountKey::generate(&mut OsRng);
        let address = key.address();
        self.register_account(address, key, mode).await?;
        Ok(address)
    }

    pub async fn authenticator(&self, address: Address) -> Result<Authenticator, WalletError> {
        let registration = self.inner.kms.lookup(address).await?;
        Ok(Authenticator::for_registration(&registration))
    }

    /// Authenticates `descriptor` as `from`, using the mode `from` was
    /// registered with.
    pub async fn create_tx_execution_request(
        &self,
        from: Address,
        descriptor: ExecutionDescriptor,
    ) -> Result<TxExecutionRequest, WalletError> {
        let authenticator = self.authenticator(from).await?;
        let circuit = self.inner.node.circuit_context().await?;
        authenticator
            .authenticate(descriptor, &circuit, &self.inner.kms)
            .await
    }

    pub async fn send_tx(&self, tx: TxExecutionRequest) -> Result<SentTx, WalletError> {
        SentTx::send(Arc::clone(&self.inner.node), tx, self.inner.config.tx_wait).await
    }

    pub async fn send(
        &self,
        from: Address,
        descriptor: ExecutionDescriptor,
    ) -> Result<SentTx, WalletError> {
        let tx = self.create_tx_execution_request(from, descriptor).await?;
        self.send_tx(tx).await
    }

    /// Runs a synchronisation pass right away.
    pub async fn sync(&self) -> Result<(), WalletError> {
        self.inner.synchronizer.sync().await
    }

    /// Whether `address` has processed every block the node currently has.
    /// Unregistered addresses are never synchronised.
    pub async fn is_account_synchronised(&self, address: Address) -> Result<bool, WalletError> {
        match self.inner.kms.lookup(address).await {
            Ok(_) => {}
            Err(KmsApiError::Backend(PreloadBackendError::KeyNotRegistered(_))) => {
                return Ok(false)
            }
            Err(e) => return Err(e.into()),
        }
        let tip = self.inner.node.get_block_number().await?;
        Ok(self.inner.synchronizer.cursor(&address).await >= tip)
    }

    pub async fn wait_for_account_sync(
        &self,
        address: Address,
        policy: RetryPolicy,
    ) -> Result<(), WalletError> {
        let label = format!("is_account_synchronised({address})");
        retry_until(|| self.is_account_synchronised(address), &label, policy)
            .await
            .map_err(|e| match e {
                RetryError::Exhausted {
                    attempts, elapsed, ..
                } => WalletError::SyncTimeout {
                    address,
                    attempts,
                    elapsed,
                },
                RetryError::Probe(e) => e,
            })
    }

    /// Synchronised, unspent notes of `contract` decrypted by `viewer`.
    pub async fn notes(&self, viewer: &Address, contract: &Address) -> Vec<NotePayload> {
        self.inner.synchronizer.notes_of(viewer, contract).await
    }

    /// Stops background synchronisation. Explicit [`Wallet::sync`] calls keep
    /// working.
    pub fn stop(&self) {
        self.inner.signal_shutdown();
    }
}
