use rand::rngs::OsRng;
use umbra_core::{
    abi::AbiValue,
    circuit::CircuitContext,
    contracts::{compute_contract_address, ContractClass},
    crypto::Fr,
    packing::pack,
    tx::{ContractDeploymentData, TxContext, TxExecutionRequest},
    Address,
};

use crate::WalletError;

/// Builds an unauthenticated deployment of `class` on behalf of `origin`.
///
/// The contract address is fixed by the class, the salt and the constructor
/// arguments, so it is known before the request is mined.
pub fn deployment_request(
    origin: Address,
    class: &ContractClass,
    args: &[AbiValue],
    salt: Fr,
    tx_context: TxContext,
    circuit: &CircuitContext,
) -> Result<TxExecutionRequest, WalletError> {
    let constructor = class
        .constructor()
        .ok_or_else(|| WalletError::NoConstructor(class.name.clone()))?;
    let packed = pack(constructor, args, circuit)?;
    let deployment = ContractDeploymentData {
        class_id: class.id(),
        salt,
        constructor_args_hash: packed.hash(),
    };
    Ok(TxExecutionRequest {
        origin,
        to: compute_contract_address(&deployment.class_id, &salt, &packed.hash()),
        function_data: constructor.function_data(),
        args_hash: packed.hash(),
        tx_context: tx_context.with_deployment(deployment),
        packed_arguments: vec![packed],
        salt: Fr::random(&mut OsRng),
        authorization: None,
    })
}
