use std::time::Duration;

use key_management_system_keys::keys::AccountKey;
use rand::rngs::OsRng;
use tests::{TestConfig, TestContext};
use umbra_core::{contracts::pokeable_token::ConstructorArgs, crypto::Fr};
use umbra_utils::retry::RetryPolicy;
use umbra_wallet::{
    contracts::{pokeable_token::PokeableTokenContract, Contract as _},
    AccountMode, WalletError,
};

#[tokio::test]
async fn polling_an_account_that_never_syncs_times_out() {
    let mut ctx = TestContext::spawn(TestConfig::fast());
    let wallet = ctx.wallet();
    let stranger = AccountKey::generate(&mut OsRng).address();

    assert!(!wallet.is_account_synchronised(stranger).await.unwrap());
    let result = wallet
        .wait_for_account_sync(stranger, ctx.config().sync_policy(3))
        .await;
    assert!(matches!(
        result,
        Err(WalletError::SyncTimeout { address, attempts: 3, .. }) if address == stranger
    ));
}

#[tokio::test]
async fn late_registrations_catch_up_from_the_first_block() {
    let mut ctx = TestContext::spawn(TestConfig::fast());
    let deployer = ctx.wallet();
    let sender_key = AccountKey::generate(&mut OsRng);
    let sender = sender_key.address();

    let token = PokeableTokenContract::deploy(
        &deployer,
        sender,
        ConstructorArgs {
            initial_supply: 42,
            sender,
            recipient: AccountKey::generate(&mut OsRng).address(),
            poker: AccountKey::generate(&mut OsRng).public_key(),
        },
        Fr::random(&mut OsRng),
    )
    .await
    .unwrap()
    .deployed()
    .await
    .unwrap();

    // A second wallet learns about the sender only after the deployment.
    let late = ctx.wallet();
    late.register_account(sender, sender_key, AccountMode::Signing)
        .await
        .unwrap();
    late.wait_for_account_sync(sender, ctx.config().sync_policy(5))
        .await
        .unwrap();

    let view = PokeableTokenContract::at(token.address(), late);
    assert_eq!(view.get_balance(sender).view(sender).await.unwrap(), 42);
}

#[tokio::test]
async fn registrations_are_fixed_once_made() {
    let mut ctx = TestContext::spawn(TestConfig::fast());
    let wallet = ctx.wallet();
    let key = AccountKey::generate(&mut OsRng);
    let address = key.address();

    let first = wallet
        .register_account(address, key.clone(), AccountMode::Signing)
        .await
        .unwrap();
    let again = wallet
        .register_account(address, key.clone(), AccountMode::Signing)
        .await
        .unwrap();
    assert_eq!(first, again);

    assert!(matches!(
        wallet
            .register_account(address, key, AccountMode::Signerless)
            .await,
        Err(WalletError::ConflictingRegistration(_))
    ));
    assert!(matches!(
        wallet
            .register_account(address, AccountKey::generate(&mut OsRng), AccountMode::Signing)
            .await,
        Err(_)
    ));
    assert_eq!(
        wallet.authenticator(address).await.unwrap().address(),
        address
    );
}

#[tokio::test]
async fn background_sync_survives_degenerate_settings() {
    let mut config = TestConfig::fast();
    config.wallet.sync_poll_interval = Duration::ZERO;
    config.wallet.sync_batch = 0;
    let mut ctx = TestContext::spawn(config);
    let wallet = ctx.wallet();
    let sender = wallet.create_account(AccountMode::Signing).await.unwrap();

    let token = PokeableTokenContract::deploy(
        &wallet,
        sender,
        ConstructorArgs {
            initial_supply: 7,
            sender,
            recipient: AccountKey::generate(&mut OsRng).address(),
            poker: AccountKey::generate(&mut OsRng).public_key(),
        },
        Fr::random(&mut OsRng),
    )
    .await
    .unwrap()
    .deployed()
    .await
    .unwrap();

    let policy = RetryPolicy::default()
        .with_max_attempts(100)
        .with_interval(Duration::from_millis(20));
    wallet.wait_for_account_sync(sender, policy).await.unwrap();
    assert_eq!(wallet.notes(&sender, &token.address()).await.len(), 1);
    assert_eq!(token.get_balance(sender).view(sender).await.unwrap(), 7);
}
