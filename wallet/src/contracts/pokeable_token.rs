use key_management_system::{api::KmsApiError, backend::preload::PreloadBackendError};
use umbra_core::{
    contracts::pokeable_token::{self, ConstructorArgs, ARTIFACT},
    crypto::Fr,
    tx::ExecutionRequest,
    Address,
};

use super::{Contract, ContractCall};
use crate::{deployment_request, DeploySentTx, Wallet, WalletError};

#[derive(Clone)]
pub struct PokeableTokenContract {
    address: Address,
    wallet: Wallet,
}

impl Contract for PokeableTokenContract {
    fn at(address: Address, wallet: Wallet) -> Self {
        Self { address, wallet }
    }

    fn address(&self) -> Address {
        self.address
    }
}

impl PokeableTokenContract {
    /// Sends an unauthenticated deployment originating from `from`.
    pub async fn deploy(
        wallet: &Wallet,
        from: Address,
        args: ConstructorArgs,
        salt: Fr,
    ) -> Result<DeploySentTx<Self>, WalletError> {
        let circuit = wallet.node().circuit_context().await?;
        let tx = deployment_request(
            from,
            &ARTIFACT,
            &args.to_values(),
            salt,
            wallet.tx_context(),
            &circuit,
        )?;
        let address = tx.to;
        let sent = wallet.send_tx(tx).await?;
        Ok(DeploySentTx::new(sent, wallet.clone(), address))
    }

    #[must_use]
    pub const fn methods(&self) -> Methods<'_> {
        Methods { contract: self }
    }

    #[must_use]
    pub const fn get_balance(&self, owner: Address) -> BalanceView<'_> {
        BalanceView {
            contract: self,
            owner,
        }
    }
}

pub struct Methods<'a> {
    contract: &'a PokeableTokenContract,
}

impl Methods<'_> {
    /// Moves the whole sender balance to the recipient. Any account may poke.
    #[must_use]
    pub fn poke(&self) -> ContractCall {
        let function_data = ARTIFACT
            .function("poke")
            .expect("poke is part of the artifact")
            .function_data();
        ContractCall::new(
            self.contract.wallet.clone(),
            ExecutionRequest::new(self.contract.address, function_data, vec![]),
        )
    }
}

pub struct BalanceView<'a> {
    contract: &'a PokeableTokenContract,
    owner: Address,
}

impl BalanceView<'_> {
    /// Reads the balance as `from`. Only the owner's own key decrypts its
    /// balance notes, so any other caller is denied.
    pub async fn view(&self, from: Address) -> Result<u128, WalletError> {
        let denied = WalletError::AccessDenied {
            owner: self.owner,
            caller: from,
        };
        if from != self.owner {
            return Err(denied);
        }
        let wallet = &self.contract.wallet;
        match wallet.kms().lookup(from).await {
            Ok(_) => {}
            Err(KmsApiError::Backend(PreloadBackendError::KeyNotRegistered(_))) => {
                return Err(denied)
            }
            Err(e) => return Err(e.into()),
        }
        wallet.sync().await?;
        let notes = wallet.notes(&from, &self.contract.address).await;
        Ok(pokeable_token::get_balance(
            &notes,
            &self.contract.address,
            &self.owner,
        )?)
    }
}
