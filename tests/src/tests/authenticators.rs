use key_management_system_keys::keys::AccountKey;
use rand::rngs::OsRng;
use tests::{TestConfig, TestContext};
use umbra_core::{
    contracts::pokeable_token::ConstructorArgs,
    crypto::Fr,
    receipt::TxStatus,
    tx::ExecutionRequestBuilder,
    Address,
};
use umbra_wallet::{
    contracts::{pokeable_token::PokeableTokenContract, Contract as _},
    AccountMode, Authenticator, Wallet, WalletError,
};

async fn deploy_token(wallet: &Wallet, sender: Address, recipient: Address) -> PokeableTokenContract {
    PokeableTokenContract::deploy(
        wallet,
        sender,
        ConstructorArgs {
            initial_supply: 100,
            sender,
            recipient,
            poker: AccountKey::generate(&mut OsRng).public_key(),
        },
        Fr::random(&mut OsRng),
    )
    .await
    .unwrap()
    .deployed()
    .await
    .unwrap()
}

#[tokio::test]
async fn signerless_accounts_send_exactly_one_execution() {
    let mut ctx = TestContext::spawn(TestConfig::fast());
    let wallet = ctx.wallet();
    let sender = wallet.create_account(AccountMode::Signing).await.unwrap();
    let recipient = wallet.create_account(AccountMode::Signing).await.unwrap();
    let poker = wallet.create_account(AccountMode::Signerless).await.unwrap();
    let token = deploy_token(&wallet, sender, recipient).await;

    assert!(matches!(
        wallet.authenticator(poker).await.unwrap(),
        Authenticator::Signerless { address } if address == poker
    ));

    let poke = token.methods().poke().request().clone();
    let batch = ExecutionRequestBuilder::new(wallet.tx_context())
        .extend_executions([poke.clone(), poke.clone()])
        .build();
    assert!(matches!(
        wallet.send(poker, batch).await,
        Err(WalletError::UnsupportedBatch { count: 2, .. })
    ));

    let single = ExecutionRequestBuilder::new(wallet.tx_context())
        .push_execution(poke)
        .build();
    let receipt = wallet
        .send(poker, single)
        .await
        .unwrap()
        .wait_mined()
        .await
        .unwrap();
    assert_eq!(receipt.status, TxStatus::Mined);
}

#[tokio::test]
async fn unregistered_origins_are_refused_before_submission() {
    let mut ctx = TestContext::spawn(TestConfig::fast());
    let wallet = ctx.wallet();
    let stranger = AccountKey::generate(&mut OsRng).address();
    let descriptor = ExecutionRequestBuilder::new(wallet.tx_context()).build();

    assert!(matches!(
        wallet.send(stranger, descriptor).await,
        Err(WalletError::UnknownAccount(address)) if address == stranger
    ));
}

#[tokio::test]
async fn signing_accounts_batch_calls_through_their_entrypoint() {
    let mut ctx = TestContext::spawn(TestConfig::fast());
    let wallet = ctx.wallet();
    let sender = wallet.create_account(AccountMode::Signing).await.unwrap();
    let recipient = wallet.create_account(AccountMode::Signing).await.unwrap();
    let first = deploy_token(&wallet, sender, recipient).await;
    let second = deploy_token(&wallet, sender, recipient).await;

    let batch = ExecutionRequestBuilder::new(wallet.tx_context())
        .push_execution(first.methods().poke().request().clone())
        .push_execution(second.methods().poke().request().clone())
        .build();
    let request = wallet
        .create_tx_execution_request(sender, batch)
        .await
        .unwrap();
    assert_eq!(request.to, sender);
    assert!(request.authorization.is_some());

    let receipt = wallet
        .send_tx(request)
        .await
        .unwrap()
        .wait_mined()
        .await
        .unwrap();
    assert_eq!(receipt.status, TxStatus::Mined);

    for token in [&first, &second] {
        assert_eq!(token.get_balance(sender).view(sender).await.unwrap(), 0);
        assert_eq!(
            token.get_balance(recipient).view(recipient).await.unwrap(),
            100
        );
    }
    assert_ne!(first.address(), second.address());
}
