use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use umbra_core::{
    block::{Block, BlockNumber},
    circuit::CircuitContext,
    receipt::TxReceipt,
    tx::{TxExecutionRequest, TxHash},
};
use umbra_ledger::LedgerError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Transaction rejected: {0}")]
    Rejected(#[from] LedgerError),
    #[error("Transaction {0} is already in the mempool")]
    AlreadyPending(TxHash),
    #[error(transparent)]
    Node(#[from] NodeError),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NodeError {
    #[error("Node is stopped")]
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub chain_id: u64,
    pub version: u32,
    pub circuit: CircuitContext,
}

/// What a wallet needs from the network.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Validates `tx` against the latest state and queues it for inclusion.
    async fn send_tx(&self, tx: TxExecutionRequest) -> Result<TxHash, SubmissionError>;

    /// `None` for hashes the node never accepted.
    async fn get_tx_receipt(&self, tx_hash: &TxHash) -> Result<Option<TxReceipt>, NodeError>;

    /// Height of the latest block, `0` before the first one.
    async fn get_block_number(&self) -> Result<BlockNumber, NodeError>;

    /// Up to `limit` consecutive blocks starting at `from`.
    async fn get_blocks(&self, from: BlockNumber, limit: usize) -> Result<Vec<Block>, NodeError>;

    async fn node_info(&self) -> Result<NodeInfo, NodeError>;

    async fn circuit_context(&self) -> Result<CircuitContext, NodeError> {
        Ok(self.node_info().await?.circuit)
    }

    async fn count_encrypted_logs_in_last_block(&self) -> Result<usize, NodeError>;

    /// Stops block production. Later calls fail with [`NodeError::Stopped`].
    async fn stop(&self);
}
