use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use umbra_node::{LocalNode, NodeApi, NodeConfig};
use umbra_utils::retry::RetryPolicy;
use umbra_wallet::{WaitOpts, Wallet, WalletConfig};

use crate::{adjust_timeout, init_test_tracing};

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct TestConfig {
    pub node: NodeConfig,
    pub wallet: WalletConfig,
}

impl TestConfig {
    /// Short block time and polling intervals so scenarios finish quickly.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            node: NodeConfig {
                block_time: Duration::from_millis(50),
                ..NodeConfig::default()
            },
            wallet: WalletConfig {
                sync_poll_interval: Duration::from_millis(20),
                tx_wait: WaitOpts {
                    timeout: adjust_timeout(Duration::from_secs(10)),
                    interval: Duration::from_millis(20),
                    min_confirmations: 0,
                },
                ..WalletConfig::default()
            },
        }
    }

    /// Policy for polling account synchronisation.
    #[must_use]
    pub fn sync_policy(&self, max_attempts: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(max_attempts)
            .with_interval(self.wallet.sync_poll_interval * 5)
            .with_timeout(adjust_timeout(Duration::from_secs(10)))
    }
}

/// A node and the wallets talking to it. Everything is stopped on drop,
/// including when a test panics.
pub struct TestContext {
    config: TestConfig,
    node: LocalNode,
    wallets: Vec<Wallet>,
}

impl TestContext {
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(config: TestConfig) -> Self {
        init_test_tracing();
        Self {
            config,
            node: LocalNode::spawn(config.node).expect("test node config must be valid"),
            wallets: Vec::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &TestConfig {
        &self.config
    }

    #[must_use]
    pub const fn node(&self) -> &LocalNode {
        &self.node
    }

    /// A fresh wallet with its own key store.
    pub fn wallet(&mut self) -> Wallet {
        let node: Arc<dyn NodeApi> = Arc::new(self.node.clone());
        let wallet = Wallet::spawn(node, self.config.wallet);
        self.wallets.push(wallet.clone());
        wallet
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        for wallet in &self.wallets {
            wallet.stop();
        }
        self.node.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_scenario_config_from_yaml() {
        let config: TestConfig = serde_yaml::from_str(
            "node:\n  block_time: 25\n  max_block_txs: 8\nwallet:\n  sync_poll_interval: 10\n",
        )
        .unwrap();
        assert_eq!(config.node.block_time, Duration::from_millis(25));
        assert_eq!(config.node.max_block_txs, 8);
        assert_eq!(config.wallet.sync_poll_interval, Duration::from_millis(10));
        assert_eq!(config.wallet.chain_id, config.node.chain_id);
    }
}
