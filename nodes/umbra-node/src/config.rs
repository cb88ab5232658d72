use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use thiserror::Error;
use umbra_core::circuit::CircuitContext;
use umbra_ledger::LedgerConfig;

pub const DEFAULT_CHAIN_ID: u64 = 31337;
pub const DEFAULT_VERSION: u32 = 1;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("block_time must be greater than zero")]
    ZeroBlockTime,
    #[error("max_block_txs must be greater than zero")]
    ZeroBlockTxs,
}

#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_version")]
    pub version: u32,
    /// Interval between two block production attempts. Empty intervals do
    /// not produce blocks.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_block_time")]
    pub block_time: Duration,
    #[serde(default = "default_max_block_txs")]
    pub max_block_txs: usize,
    #[serde(default)]
    pub circuit: CircuitContext,
}

impl NodeConfig {
    /// Rejects settings a block producer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_time.is_zero() {
            return Err(ConfigError::ZeroBlockTime);
        }
        if self.max_block_txs == 0 {
            return Err(ConfigError::ZeroBlockTxs);
        }
        Ok(())
    }

    #[must_use]
    pub const fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            chain_id: self.chain_id,
            version: self.version,
            circuit: self.circuit,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            version: default_version(),
            block_time: default_block_time(),
            max_block_txs: default_max_block_txs(),
            circuit: CircuitContext::default(),
        }
    }
}

const fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

const fn default_version() -> u32 {
    DEFAULT_VERSION
}

const fn default_block_time() -> Duration {
    Duration::from_millis(200)
}

const fn default_max_block_txs() -> usize {
    32
}
