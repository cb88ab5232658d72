pub mod api;
mod chain;
pub mod config;
mod mempool;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, Weak,
    },
    time::Duration,
};

use async_trait::async_trait;
use rand::rngs::OsRng;
use tokio::{
    sync::{oneshot, RwLock},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info};
use umbra_core::{
    block::{Block, BlockNumber},
    receipt::TxReceipt,
    tx::{TxExecutionRequest, TxHash},
};
use umbra_ledger::{ContractRegistry, Ledger};

pub use crate::{
    api::{NodeApi, NodeError, NodeInfo, SubmissionError},
    config::{ConfigError, NodeConfig},
};
use crate::chain::Chain;

/// In-process node with a single block producer.
///
/// Cheap to clone. Block production stops on [`NodeApi::stop`] or once the
/// last handle is dropped.
#[derive(Clone)]
pub struct LocalNode {
    inner: Arc<Inner>,
    producer: Arc<tokio::sync::Mutex<Option<JoinHandle<()>>>>,
}

struct Inner {
    config: NodeConfig,
    chain: RwLock<Chain>,
    stopped: AtomicBool,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl LocalNode {
    /// Starts a node with the built-in contract classes. Must be called from
    /// within a tokio runtime.
    pub fn spawn(config: NodeConfig) -> Result<Self, ConfigError> {
        Self::spawn_with_registry(config, ContractRegistry::with_builtins())
    }

    pub fn spawn_with_registry(
        config: NodeConfig,
        registry: ContractRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (shutdown, shutdown_rx) = oneshot::channel();
        let inner = Arc::new(Inner {
            config,
            chain: RwLock::new(Chain::new(Ledger::new(config.ledger_config(), registry))),
            stopped: AtomicBool::new(false),
            shutdown: Mutex::new(Some(shutdown)),
        });
        let producer = tokio::spawn(run_producer(
            Arc::downgrade(&inner),
            config.block_time,
            shutdown_rx,
        ));
        info!(
            chain_id = config.chain_id,
            version = config.version,
            block_time = ?config.block_time,
            "Local node started"
        );
        Ok(Self {
            inner,
            producer: Arc::new(tokio::sync::Mutex::new(Some(producer))),
        })
    }

    #[must_use]
    pub fn config(&self) -> &NodeConfig {
        &self.inner.config
    }

    /// Produces a block right away instead of waiting for the next tick.
    pub async fn mine_block(&self) -> Result<Option<BlockNumber>, NodeError> {
        self.inner.ensure_running()?;
        Ok(self.inner.produce_block().await)
    }

    pub async fn last_block(&self) -> Result<Option<Block>, NodeError> {
        self.inner.ensure_running()?;
        Ok(self.inner.chain.read().await.last_block().cloned())
    }

    /// Signals the producer without waiting for it, usable from `Drop`.
    pub fn shutdown(&self) {
        self.inner.signal_shutdown();
    }
}

impl Inner {
    fn ensure_running(&self) -> Result<(), NodeError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(NodeError::Stopped);
        }
        Ok(())
    }

    fn signal_shutdown(&self) {
        self.stopped.store(true, Ordering::Release);
        let sender = self.shutdown.lock().ok().and_then(|mut shutdown| shutdown.take());
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }

    async fn produce_block(&self) -> Option<BlockNumber> {
        let mut chain = self.chain.write().await;
        let block = chain.produce_block(self.config.max_block_txs, &mut OsRng)?;
        info!(
            number = block.number,
            id = %block.id,
            txs = block.effects.len(),
            logs = block.encrypted_log_count(),
            "Produced block"
        );
        Some(block.number)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.signal_shutdown();
    }
}

async fn run_producer(
    node: Weak<Inner>,
    block_time: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = interval_at(Instant::now() + block_time, block_time);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let Some(inner) = node.upgrade() else {
                    break;
                };
                inner.produce_block().await;
            }
        }
    }
    debug!("Block producer stopped");
}

#[async_trait]
impl NodeApi for LocalNode {
    async fn send_tx(&self, tx: TxExecutionRequest) -> Result<TxHash, SubmissionError> {
        self.inner.ensure_running()?;
        self.inner.chain.write().await.submit(tx)
    }

    async fn get_tx_receipt(&self, tx_hash: &TxHash) -> Result<Option<TxReceipt>, NodeError> {
        self.inner.ensure_running()?;
        Ok(self.inner.chain.read().await.receipt(tx_hash).cloned())
    }

    async fn get_block_number(&self) -> Result<BlockNumber, NodeError> {
        self.inner.ensure_running()?;
        Ok(self.inner.chain.read().await.block_number())
    }

    async fn get_blocks(&self, from: BlockNumber, limit: usize) -> Result<Vec<Block>, NodeError> {
        self.inner.ensure_running()?;
        Ok(self.inner.chain.read().await.blocks_from(from, limit))
    }

    async fn node_info(&self) -> Result<NodeInfo, NodeError> {
        self.inner.ensure_running()?;
        let chain = self.inner.chain.read().await;
        let config = chain.ledger().config();
        Ok(NodeInfo {
            chain_id: config.chain_id,
            version: config.version,
            circuit: config.circuit,
        })
    }

    async fn count_encrypted_logs_in_last_block(&self) -> Result<usize, NodeError> {
        self.inner.ensure_running()?;
        Ok(self
            .inner
            .chain
            .read()
            .await
            .last_block()
            .map_or(0, Block::encrypted_log_count))
    }

    async fn stop(&self) {
        self.inner.signal_shutdown();
        let producer = self.producer.lock().await.take();
        if let Some(producer) = producer {
            let _ = producer.await;
        }
        info!("Local node stopped");
    }
}
