use std::time::Duration;

use key_management_system_keys::keys::AccountKey;
use rand::rngs::OsRng;
use tests::{TestConfig, TestContext};
use umbra_core::{
    contracts::pokeable_token::{ConstructorArgs, ARTIFACT},
    crypto::Fr,
    receipt::TxStatus,
    Address,
};
use umbra_node::{NodeApi as _, NodeConfig};
use umbra_wallet::{deployment_request, TxLifecycle, WaitOpts, Wallet, WalletError};

async fn token_deployment(wallet: &Wallet, salt: Fr) -> umbra_core::tx::TxExecutionRequest {
    let args = ConstructorArgs {
        initial_supply: 10,
        sender: AccountKey::generate(&mut OsRng).address(),
        recipient: AccountKey::generate(&mut OsRng).address(),
        poker: AccountKey::generate(&mut OsRng).public_key(),
    };
    let circuit = wallet.node().circuit_context().await.unwrap();
    deployment_request(
        Address::ZERO,
        &ARTIFACT,
        &args.to_values(),
        salt,
        wallet.tx_context(),
        &circuit,
    )
    .unwrap()
}

#[tokio::test]
async fn waiting_twice_returns_the_cached_receipt() {
    let mut ctx = TestContext::spawn(TestConfig::fast());
    let wallet = ctx.wallet();

    let sent = wallet
        .send_tx(token_deployment(&wallet, Fr::ONE).await)
        .await
        .unwrap();
    let first = sent.wait_mined().await.unwrap();
    let height = ctx.node().get_block_number().await.unwrap();
    let second = sent.wait_mined().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.status, TxStatus::Mined);
    assert_eq!(sent.lifecycle().await, TxLifecycle::Mined);

    let blocks = ctx.node().get_blocks(0, 100).await.unwrap();
    let inclusions = blocks
        .iter()
        .flat_map(|block| &block.effects)
        .filter(|effect| effect.tx_hash == sent.tx_hash())
        .count();
    assert_eq!(inclusions, 1);
    assert_eq!(ctx.node().get_block_number().await.unwrap(), height);
}

#[tokio::test]
async fn dropped_transactions_are_never_reported_as_mined() {
    let mut ctx = TestContext::spawn(TestConfig::fast());
    let wallet = ctx.wallet();

    // Same contract address, different requests: only one deployment can win.
    let first = token_deployment(&wallet, Fr::ONE).await;
    let mut second = first.clone();
    second.salt = Fr::random(&mut OsRng);

    let first = wallet.send_tx(first).await.unwrap();
    let second = wallet.send_tx(second).await.unwrap();

    assert_eq!(first.wait_mined().await.unwrap().status, TxStatus::Mined);
    let rejected = second.wait_mined().await;
    assert!(
        matches!(rejected, Err(WalletError::Rejected { tx_hash, .. }) if tx_hash == second.tx_hash())
    );
    assert_eq!(second.lifecycle().await, TxLifecycle::Rejected);
}

#[tokio::test]
async fn waiting_gives_up_at_the_timeout() {
    let mut config = TestConfig::fast();
    config.node = NodeConfig {
        block_time: Duration::from_secs(3600),
        ..config.node
    };
    let mut ctx = TestContext::spawn(config);
    let wallet = ctx.wallet();

    let sent = wallet
        .send_tx(token_deployment(&wallet, Fr::ONE).await)
        .await
        .unwrap();
    assert_eq!(sent.lifecycle().await, TxLifecycle::Sent);

    let opts = WaitOpts {
        timeout: Duration::from_millis(200),
        interval: Duration::from_millis(20),
        min_confirmations: 0,
    };
    assert!(matches!(
        sent.wait_mined_with(opts).await,
        Err(WalletError::Timeout { .. })
    ));
    assert_eq!(sent.lifecycle().await, TxLifecycle::Pending);

    // Mining later still resolves the same handle.
    ctx.node().mine_block().await.unwrap();
    assert_eq!(sent.wait_mined().await.unwrap().status, TxStatus::Mined);
}

#[tokio::test]
async fn confirmations_wait_for_later_blocks() {
    let mut ctx = TestContext::spawn(TestConfig::fast());
    let wallet = ctx.wallet();

    let sent = wallet
        .send_tx(token_deployment(&wallet, Fr::ONE).await)
        .await
        .unwrap();
    let mined = sent.wait_mined().await.unwrap();
    let included = mined.block_number.unwrap();

    // Blocks are only produced for non-empty mempools.
    let filler = wallet
        .send_tx(token_deployment(&wallet, Fr::from(2u64)).await)
        .await
        .unwrap();
    let opts = WaitOpts {
        min_confirmations: 1,
        ..wallet.config().tx_wait
    };
    let confirmed = sent.wait_mined_with(opts).await.unwrap();
    assert_eq!(confirmed, mined);
    assert!(filler.wait_mined().await.unwrap().block_number.unwrap() > included);
}
