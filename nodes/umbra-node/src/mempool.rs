use std::collections::{HashSet, VecDeque};

use umbra_core::tx::{TxExecutionRequest, TxHash};

/// First in, first out queue of validated transactions.
#[derive(Debug, Default)]
pub struct Mempool {
    queue: VecDeque<TxExecutionRequest>,
    pending: HashSet<TxHash>,
}

impl Mempool {
    /// Returns `false` if a transaction with the same hash is already queued.
    pub fn add(&mut self, tx_hash: TxHash, tx: TxExecutionRequest) -> bool {
        if !self.pending.insert(tx_hash) {
            return false;
        }
        self.queue.push_back(tx);
        true
    }

    pub fn take(&mut self, max: usize) -> Vec<TxExecutionRequest> {
        let count = max.min(self.queue.len());
        let txs: Vec<_> = self.queue.drain(..count).collect();
        for tx in &txs {
            self.pending.remove(&tx.hash());
        }
        txs
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
