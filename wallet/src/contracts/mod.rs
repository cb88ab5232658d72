//! Typed bindings to deployed contracts.
pub mod pokeable_token;

use umbra_core::{
    tx::{ExecutionRequest, ExecutionRequestBuilder},
    Address,
};

use crate::{SentTx, Wallet, WalletError};

pub trait Contract: Sized {
    fn at(address: Address, wallet: Wallet) -> Self;

    fn address(&self) -> Address;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendOptions {
    pub from: Address,
    pub max_fee: u64,
}

impl SendOptions {
    #[must_use]
    pub const fn new(from: Address) -> Self {
        Self { from, max_fee: 0 }
    }
}

/// A single function call, ready to be authenticated and sent.
pub struct ContractCall {
    wallet: Wallet,
    execution: ExecutionRequest,
}

impl ContractCall {
    pub(crate) const fn new(wallet: Wallet, execution: ExecutionRequest) -> Self {
        Self { wallet, execution }
    }

    #[must_use]
    pub const fn request(&self) -> &ExecutionRequest {
        &self.execution
    }

    pub async fn send(self, options: SendOptions) -> Result<SentTx, WalletError> {
        let descriptor =
            ExecutionRequestBuilder::new(self.wallet.tx_context().with_max_fee(options.max_fee))
                .push_execution(self.execution)
                .build();
        self.wallet.send(options.from, descriptor).await
    }
}
