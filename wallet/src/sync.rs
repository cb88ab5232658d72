//! Background synchronisation of registered accounts against the node.
use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{
    sync::{oneshot, Mutex},
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, trace, warn};
use umbra_core::{
    block::{Block, BlockNumber},
    logs::NotePayload,
    Address,
};
use umbra_node::NodeApi;

use crate::{notes::NoteStore, Kms, WalletError};

#[derive(Debug, Default)]
struct SyncState {
    /// Last block processed for each account.
    cursors: HashMap<Address, BlockNumber>,
    /// Last block whose nullifiers were applied.
    global: BlockNumber,
    notes: NoteStore,
}

pub struct Synchronizer {
    node: Arc<dyn NodeApi>,
    kms: Kms,
    batch: usize,
    state: Mutex<SyncState>,
}

impl Synchronizer {
    pub fn new(node: Arc<dyn NodeApi>, kms: Kms, batch: usize) -> Self {
        Self {
            node,
            kms,
            batch: batch.max(1),
            state: Mutex::new(SyncState::default()),
        }
    }

    /// Block processed last for `address`, `0` if none yet.
    pub async fn cursor(&self, address: &Address) -> BlockNumber {
        self.state
            .lock()
            .await
            .cursors
            .get(address)
            .copied()
            .unwrap_or_default()
    }

    pub async fn notes_of(&self, viewer: &Address, contract: &Address) -> Vec<NotePayload> {
        self.state.lock().await.notes.notes_of(viewer, contract)
    }

    /// Brings every registered account up to the current tip.
    ///
    /// Accounts registered since the last pass start from the first block.
    pub async fn sync(&self) -> Result<(), WalletError> {
        let mut state = self.state.lock().await;
        let tip = self.node.get_block_number().await?;
        let accounts = self.kms.registrations().await?;

        let from = accounts
            .iter()
            .map(|account| state.cursors.get(&account.key_id).copied().unwrap_or_default())
            .chain([state.global])
            .min()
            .unwrap_or(state.global);
        if from >= tip {
            return Ok(());
        }
        let blocks = self.fetch(from + 1, tip).await?;

        let global = state.global;
        for block in blocks.iter().filter(|block| block.number > global) {
            state.notes = state.notes.nullify(block.nullifiers());
            state.global = block.number;
        }

        for account in accounts {
            let address = account.key_id;
            let cursor = state.cursors.get(&address).copied().unwrap_or_default();
            let mut decrypted = 0usize;
            let mut reached = cursor;
            for block in blocks.iter().filter(|block| block.number > cursor) {
                for log in block.encrypted_logs() {
                    if let Some(payload) = self.kms.try_decrypt(address, log.clone()).await? {
                        state.notes = state.notes.insert(address, payload);
                        decrypted += 1;
                    }
                }
                reached = block.number;
            }
            if reached > cursor {
                debug!(%address, from = cursor, to = reached, decrypted, "Synchronised account");
            }
            state.cursors.insert(address, reached);
        }
        Ok(())
    }

    async fn fetch(&self, from: BlockNumber, to: BlockNumber) -> Result<Vec<Block>, WalletError> {
        let mut blocks = Vec::new();
        let mut next = from;
        while next <= to {
            let batch = self.node.get_blocks(next, self.batch).await?;
            let Some(last) = batch.last().map(|block| block.number) else {
                break;
            };
            trace!(from = next, to = last, "Fetched blocks");
            blocks.extend(batch.into_iter().filter(|block| block.number <= to));
            next = last + 1;
        }
        Ok(blocks)
    }
}

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Runs [`Synchronizer::sync`] every `poll_interval` until `shutdown` fires.
pub async fn run_synchronizer(
    synchronizer: Arc<Synchronizer>,
    poll_interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = interval(poll_interval.max(MIN_POLL_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                if let Err(e) = synchronizer.sync().await {
                    warn!("Synchronisation pass failed: {e}");
                }
            }
        }
    }
    debug!("Synchronizer stopped");
}
