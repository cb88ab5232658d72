use key_management_system_keys::keys::AccountKey;
use rand::rngs::OsRng;
use tests::{TestConfig, TestContext};
use umbra_core::{
    contracts::pokeable_token::{ConstructorArgs, ParticipantsNote},
    crypto::Fr,
    receipt::TxStatus,
};
use umbra_node::NodeApi as _;
use umbra_wallet::{
    contracts::{pokeable_token::PokeableTokenContract, Contract as _, SendOptions},
    AccountMode, WalletError,
};

#[tokio::test]
async fn poke_moves_the_whole_balance_to_the_recipient() {
    let mut ctx = TestContext::spawn(TestConfig::fast());
    let wallet = ctx.wallet();
    let sender = wallet.create_account(AccountMode::Signing).await.unwrap();
    let recipient = wallet.create_account(AccountMode::Signing).await.unwrap();
    let poker_key = AccountKey::generate(&mut OsRng);
    let poker = poker_key.address();

    let deployment = PokeableTokenContract::deploy(
        &wallet,
        sender,
        ConstructorArgs {
            initial_supply: 987,
            sender,
            recipient,
            poker: poker_key.public_key(),
        },
        Fr::random(&mut OsRng),
    )
    .await
    .unwrap();
    let receipt = deployment.wait_mined().await.unwrap();
    assert_eq!(receipt.status, TxStatus::Mined);
    assert_eq!(receipt.contract_address, Some(deployment.address()));
    assert_eq!(
        ctx.node().count_encrypted_logs_in_last_block().await.unwrap(),
        3
    );

    let token = deployment.deployed().await.unwrap();
    let sender_before = token.get_balance(sender).view(sender).await.unwrap();
    let recipient_before = token.get_balance(recipient).view(recipient).await.unwrap();
    assert_eq!(sender_before, 987);
    assert_eq!(recipient_before, 0);

    // The poker was never a signer: it only observes and pokes.
    wallet
        .register_account(poker, poker_key, AccountMode::Signerless)
        .await
        .unwrap();
    wallet
        .wait_for_account_sync(poker, ctx.config().sync_policy(5))
        .await
        .unwrap();
    let participants: Vec<_> = wallet
        .notes(&poker, &token.address())
        .await
        .iter()
        .filter_map(ParticipantsNote::from_payload)
        .collect();
    assert_eq!(
        participants,
        vec![ParticipantsNote { sender, recipient }]
    );

    let receipt = token
        .methods()
        .poke()
        .send(SendOptions::new(poker))
        .await
        .unwrap()
        .wait_mined()
        .await
        .unwrap();
    assert_eq!(receipt.status, TxStatus::Mined);
    assert_eq!(
        ctx.node().count_encrypted_logs_in_last_block().await.unwrap(),
        1
    );

    let sender_after = token.get_balance(sender).view(sender).await.unwrap();
    let recipient_after = token.get_balance(recipient).view(recipient).await.unwrap();
    assert_eq!(sender_after, 0);
    assert_eq!(recipient_after, 987);
    assert_eq!(
        sender_after + recipient_after,
        sender_before + recipient_before
    );
}

#[tokio::test]
async fn balances_are_only_readable_by_their_owner() {
    let mut ctx = TestContext::spawn(TestConfig::fast());
    let wallet = ctx.wallet();
    let outsider = ctx.wallet();
    let sender = wallet.create_account(AccountMode::Signing).await.unwrap();
    let recipient = wallet.create_account(AccountMode::Signing).await.unwrap();

    let token = PokeableTokenContract::deploy(
        &wallet,
        sender,
        ConstructorArgs {
            initial_supply: 5,
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
    .unwrap();

    assert!(matches!(
        token.get_balance(recipient).view(sender).await,
        Err(WalletError::AccessDenied { .. })
    ));

    // Same contract seen from a wallet that holds none of the keys.
    let foreign = PokeableTokenContract::at(token.address(), outsider);
    assert!(matches!(
        foreign.get_balance(sender).view(sender).await,
        Err(WalletError::AccessDenied { .. })
    ));
}
