use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use umbra_node::config::{DEFAULT_CHAIN_ID, DEFAULT_VERSION};
use umbra_utils::retry::RetryPolicy;

/// How [`crate::tx::SentTx::wait_mined`] polls for a receipt.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOpts {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub interval: Duration,
    /// Blocks required on top of the one including the transaction.
    #[serde(default)]
    pub min_confirmations: u64,
}

impl WaitOpts {
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: u32::MAX,
            interval: self.interval,
            timeout: self.timeout,
        }
    }
}

impl Default for WaitOpts {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            interval: Duration::from_millis(100),
            min_confirmations: 0,
        }
    }
}

#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_sync_poll_interval")]
    pub sync_poll_interval: Duration,
    /// Blocks fetched per node round-trip while synchronising.
    #[serde(default = "default_sync_batch")]
    pub sync_batch: usize,
    #[serde(default)]
    pub tx_wait: WaitOpts,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            version: default_version(),
            sync_poll_interval: default_sync_poll_interval(),
            sync_batch: default_sync_batch(),
            tx_wait: WaitOpts::default(),
        }
    }
}

const fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

const fn default_version() -> u32 {
    DEFAULT_VERSION
}

const fn default_sync_poll_interval() -> Duration {
    Duration::from_millis(100)
}

const fn default_sync_batch() -> usize {
    16
}
