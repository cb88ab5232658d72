use std::{marker::PhantomData, sync::Arc};

use tokio::sync::Mutex;
use tracing::{debug, warn};
use umbra_core::{
    receipt::{TxReceipt, TxStatus},
    tx::{TxExecutionRequest, TxHash},
    Address,
};
use umbra_node::NodeApi;
use umbra_utils::retry::{poll_until, RetryError};

use crate::{config::WaitOpts, contracts::Contract, Wallet, WalletError};

/// Client side view of a transaction.
///
/// Moves forward only: `Created -> Sent -> Pending -> Mined | Rejected`.
/// `Pending` may be skipped when the first receipt is already terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxLifecycle {
    Created,
    Sent,
    Pending,
    Mined,
    Rejected,
}

impl TxLifecycle {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Sent)
                | (Self::Sent | Self::Pending, Self::Pending | Self::Mined | Self::Rejected)
        ) || matches!(
            (self, next),
            (Self::Mined, Self::Mined) | (Self::Rejected, Self::Rejected)
        )
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Mined | Self::Rejected)
    }

    const fn from_status(status: TxStatus) -> Self {
        match status {
            TxStatus::Pending => Self::Pending,
            TxStatus::Mined => Self::Mined,
            TxStatus::Dropped => Self::Rejected,
        }
    }
}

#[derive(Debug)]
struct Tracker {
    lifecycle: TxLifecycle,
    receipt: Option<TxReceipt>,
}

impl Tracker {
    fn transition(&mut self, tx_hash: TxHash, next: TxLifecycle) -> Result<(), WalletError> {
        if !self.lifecycle.can_transition_to(next) {
            return Err(WalletError::InvalidTransition {
                tx_hash,
                from: self.lifecycle,
                to: next,
            });
        }
        if self.lifecycle != next {
            debug!(tx = %tx_hash, from = ?self.lifecycle, to = ?next, "Transaction moved");
        }
        self.lifecycle = next;
        Ok(())
    }
}

/// Handle to a submitted transaction.
///
/// Observing it never resubmits: once a terminal receipt is seen it is cached
/// and returned as is.
pub struct SentTx {
    node: Arc<dyn NodeApi>,
    tx_hash: TxHash,
    wait: WaitOpts,
    tracker: Mutex<Tracker>,
}

impl SentTx {
    pub(crate) async fn send(
        node: Arc<dyn NodeApi>,
        tx: TxExecutionRequest,
        wait: WaitOpts,
    ) -> Result<Self, WalletError> {
        let tx_hash = tx.hash();
        let mut tracker = Tracker {
            lifecycle: TxLifecycle::Created,
            receipt: None,
        };
        let accepted = node.send_tx(tx).await?;
        debug_assert_eq!(accepted, tx_hash);
        tracker.transition(tx_hash, TxLifecycle::Sent)?;
        Ok(Self {
            node,
            tx_hash,
            wait,
            tracker: Mutex::new(tracker),
        })
    }

    #[must_use]
    pub const fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub async fn lifecycle(&self) -> TxLifecycle {
        self.tracker.lock().await.lifecycle
    }

    /// Latest receipt, from the cache once terminal.
    pub async fn get_receipt(&self) -> Result<TxReceipt, WalletError> {
        let mut tracker = self.tracker.lock().await;
        if let Some(receipt) = tracker.receipt.as_ref().filter(|receipt| receipt.is_terminal()) {
            return Ok(receipt.clone());
        }
        let receipt = self
            .node
            .get_tx_receipt(&self.tx_hash)
            .await?
            .unwrap_or_else(|| TxReceipt::pending(self.tx_hash));
        tracker.transition(self.tx_hash, TxLifecycle::from_status(receipt.status))?;
        tracker.receipt = Some(receipt.clone());
        Ok(receipt)
    }

    pub async fn wait_mined(&self) -> Result<TxReceipt, WalletError> {
        self.wait_mined_with(self.wait).await
    }

    /// Polls until the transaction is mined with `min_confirmations` blocks on
    /// top of it. A dropped transaction fails with [`WalletError::Rejected`].
    pub async fn wait_mined_with(&self, opts: WaitOpts) -> Result<TxReceipt, WalletError> {
        let label = format!("wait_mined({})", self.tx_hash);
        let result = poll_until(
            || self.probe(opts.min_confirmations),
            &label,
            opts.retry_policy(),
        )
        .await;
        result.map_err(|e| match e {
            RetryError::Exhausted { elapsed, .. } => WalletError::Timeout {
                tx_hash: self.tx_hash,
                elapsed,
            },
            RetryError::Probe(e) => e,
        })
    }

    async fn probe(&self, min_confirmations: u64) -> Result<Option<TxReceipt>, WalletError> {
        let receipt = self.get_receipt().await?;
        match receipt.status {
            TxStatus::Pending => Ok(None),
            TxStatus::Dropped => {
                let reason = receipt.error.unwrap_or_default();
                warn!(tx = %self.tx_hash, "Transaction rejected: {reason}");
                Err(WalletError::Rejected {
                    tx_hash: self.tx_hash,
                    reason,
                })
            }
            TxStatus::Mined => self.confirmed(receipt, min_confirmations).await,
        }
    }

    async fn confirmed(
        &self,
        receipt: TxReceipt,
        min_confirmations: u64,
    ) -> Result<Option<TxReceipt>, WalletError> {
        if min_confirmations == 0 {
            return Ok(Some(receipt));
        }
        let included = receipt.block_number.unwrap_or_default();
        let tip = self.node.get_block_number().await?;
        Ok((tip.saturating_sub(included) >= min_confirmations).then_some(receipt))
    }
}

/// A deployment on its way, yielding a contract binding once mined.
pub struct DeploySentTx<C> {
    sent: SentTx,
    wallet: Wallet,
    address: Address,
    contract: PhantomData<fn() -> C>,
}

impl<C: Contract> DeploySentTx<C> {
    pub(crate) const fn new(sent: SentTx, wallet: Wallet, address: Address) -> Self {
        Self {
            sent,
            wallet,
            address,
            contract: PhantomData,
        }
    }

    /// Address the contract will live at, known before mining.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub const fn sent(&self) -> &SentTx {
        &self.sent
    }

    pub async fn wait_mined(&self) -> Result<TxReceipt, WalletError> {
        self.sent.wait_mined().await
    }

    /// Waits for the deployment and returns the binding to the new contract.
    pub async fn deployed(&self) -> Result<C, WalletError> {
        let receipt = self.sent.wait_mined().await?;
        let address = receipt
            .contract_address
            .ok_or(WalletError::MissingContractAddress(receipt.tx_hash))?;
        Ok(C::at(address, self.wallet.clone()))
    }
}
