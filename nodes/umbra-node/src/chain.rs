use std::collections::HashMap;

use rand::RngCore;
use tracing::{debug, warn};
use umbra_core::{
    block::{Block, BlockId, BlockNumber},
    receipt::TxReceipt,
    tx::{TxExecutionRequest, TxHash},
};
use umbra_ledger::{Ledger, LedgerState};

use crate::{mempool::Mempool, SubmissionError};

/// Single producer chain: every block extends the previous one.
pub struct Chain {
    ledger: Ledger,
    state: LedgerState,
    blocks: Vec<Block>,
    receipts: HashMap<TxHash, TxReceipt>,
    mempool: Mempool,
}

impl Chain {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            state: LedgerState::new(),
            blocks: Vec::new(),
            receipts: HashMap::new(),
            mempool: Mempool::default(),
        }
    }

    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn block_number(&self) -> BlockNumber {
        self.blocks.last().map_or(0, |block| block.number)
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Blocks are numbered from 1, so `from == 0` starts at the first one.
    pub fn blocks_from(&self, from: BlockNumber, limit: usize) -> Vec<Block> {
        let skip = usize::try_from(from.saturating_sub(1)).unwrap_or(usize::MAX);
        self.blocks.iter().skip(skip).take(limit).cloned().collect()
    }

    pub fn receipt(&self, tx_hash: &TxHash) -> Option<&TxReceipt> {
        self.receipts.get(tx_hash)
    }

    pub fn submit(&mut self, tx: TxExecutionRequest) -> Result<TxHash, SubmissionError> {
        self.ledger.validate(&self.state, &tx)?;
        let tx_hash = tx.hash();
        if !self.mempool.add(tx_hash, tx) {
            return Err(SubmissionError::AlreadyPending(tx_hash));
        }
        self.receipts.insert(tx_hash, TxReceipt::pending(tx_hash));
        debug!(tx = %tx_hash, pending = self.mempool.len(), "Accepted transaction");
        Ok(tx_hash)
    }

    /// Applies up to `max_txs` queued transactions on top of the tip.
    ///
    /// Transactions that fail are dropped with an error receipt. Returns
    /// `None` when nothing was included.
    pub fn produce_block(&mut self, max_txs: usize, rng: &mut dyn RngCore) -> Option<&Block> {
        if self.mempool.is_empty() {
            return None;
        }
        let number = self.block_number() + 1;
        let mut effects = Vec::new();
        let mut included = Vec::new();
        for tx in self.mempool.take(max_txs) {
            let tx_hash = tx.hash();
            match self.ledger.try_apply_tx(self.state.clone(), &tx, rng) {
                Ok((state, applied)) => {
                    self.state = state;
                    effects.push(applied.effect);
                    included.push((tx_hash, applied.contract_address));
                }
                Err(e) => {
                    warn!(tx = %tx_hash, "Dropping transaction: {e}");
                    self.receipts
                        .insert(tx_hash, TxReceipt::dropped(tx_hash, e.to_string()));
                }
            }
        }
        if effects.is_empty() {
            return None;
        }

        for (tx_hash, contract_address) in included {
            self.receipts
                .insert(tx_hash, TxReceipt::mined(tx_hash, number, contract_address));
        }
        let parent = self.last_block().map_or_else(BlockId::default, |block| block.id);
        self.blocks.push(Block::new(number, parent, effects));
        self.blocks.last()
    }
}
