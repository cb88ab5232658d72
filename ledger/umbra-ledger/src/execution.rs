use rand::RngCore;
use tracing::{debug, trace};
use umbra_core::{
    block::TxEffect,
    contracts::{compute_contract_address, CallContext, ContractError, ContractOutput},
    crypto::Fr,
    logs::EncryptedLog,
    tx::{
        entrypoint::{EntrypointPayload, ENTRYPOINT_SELECTOR},
        ContractDeploymentData, FunctionData, FunctionKind, TxExecutionRequest,
    },
    Address,
};

use crate::{ContractInstance, Ledger, LedgerError, LedgerState};

/// Outcome of a transaction that made it into the state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedTx {
    pub effect: TxEffect,
    pub contract_address: Option<Address>,
}

struct Call<'a> {
    to: Address,
    function_data: FunctionData,
    args: &'a [Fr],
}

impl Ledger {
    /// Stateless checks plus duplicate detection. Everything here can be run
    /// before a transaction enters the mempool.
    pub fn validate(&self, state: &LedgerState, tx: &TxExecutionRequest) -> Result<(), LedgerError> {
        let context = &tx.tx_context;
        if context.chain_id != self.config.chain_id || context.version != self.config.version {
            return Err(LedgerError::InvalidTxContext {
                chain_id: context.chain_id,
                version: context.version,
                expected_chain_id: self.config.chain_id,
                expected_version: self.config.version,
            });
        }

        let tx_hash = tx.hash();
        if state.contains_tx(&tx_hash) {
            return Err(LedgerError::DuplicateTx(tx_hash));
        }

        for packed in &tx.packed_arguments {
            if packed.circuit_version() != self.config.circuit.version
                || packed.fields().len() > self.config.circuit.max_args
                || !packed.verify()
            {
                return Err(LedgerError::InvalidPackedArguments {
                    hash: packed.hash(),
                });
            }
        }
        if tx.find_packed(&tx.args_hash).is_none() {
            return Err(LedgerError::MissingArguments(tx.args_hash));
        }

        if let Some(authorization) = &tx.authorization {
            authorization
                .public_key
                .verify(tx.signing_hash().as_bytes(), &authorization.signature)
                .map_err(|_| LedgerError::InvalidSignature)?;
            let signer = Address::from_public_key(&authorization.public_key);
            if signer != tx.origin {
                return Err(LedgerError::OriginMismatch {
                    origin: tx.origin,
                    signer,
                });
            }
        }
        Ok(())
    }

    /// Validates and executes `tx` on top of `state`.
    ///
    /// On failure the given state is dropped unchanged from the caller's
    /// point of view: only the returned state carries the transaction.
    pub fn try_apply_tx(
        &self,
        mut state: LedgerState,
        tx: &TxExecutionRequest,
        rng: &mut dyn RngCore,
    ) -> Result<(LedgerState, AppliedTx), LedgerError> {
        self.validate(&state, tx)?;

        let tx_hash = tx.hash();
        let mut effect = TxEffect {
            tx_hash,
            ..TxEffect::default()
        };
        let args = self.packed_args(tx, &tx.args_hash)?;

        let contract_address = if let Some(deployment) = &tx.tx_context.deployment {
            self.deploy(&mut state, tx, deployment, args, &mut effect, rng)?;
            Some(tx.to)
        } else if tx.function_data.selector == *ENTRYPOINT_SELECTOR && tx.to == tx.origin {
            if tx.authorization.is_none() {
                return Err(LedgerError::Unauthorized(tx.origin));
            }
            let payload = EntrypointPayload::from_fields(args)?;
            trace!(tx = %tx_hash, calls = payload.calls.len(), "Executing entrypoint");
            for call in &payload.calls {
                let call = Call {
                    to: call.to,
                    function_data: call.function_data,
                    args: self.packed_args(tx, &call.args_hash)?,
                };
                self.call(&mut state, tx.origin, &call, &mut effect, rng)?;
            }
            None
        } else {
            let call = Call {
                to: tx.to,
                function_data: tx.function_data,
                args,
            };
            self.call(&mut state, tx.origin, &call, &mut effect, rng)?;
            None
        };

        state.record_tx(tx_hash);
        debug!(
            tx = %tx_hash,
            notes = effect.note_commitments.len(),
            nullifiers = effect.nullifiers.len(),
            logs = effect.encrypted_logs.len(),
            "Applied transaction"
        );
        Ok((
            state,
            AppliedTx {
                effect,
                contract_address,
            },
        ))
    }

    fn packed_args<'tx>(
        &self,
        tx: &'tx TxExecutionRequest,
        hash: &Fr,
    ) -> Result<&'tx [Fr], LedgerError> {
        tx.find_packed(hash)
            .map(|packed| packed.fields())
            .ok_or(LedgerError::MissingArguments(*hash))
    }

    fn deploy(
        &self,
        state: &mut LedgerState,
        tx: &TxExecutionRequest,
        deployment: &ContractDeploymentData,
        args: &[Fr],
        effect: &mut TxEffect,
        rng: &mut dyn RngCore,
    ) -> Result<(), LedgerError> {
        let contract = self
            .registry
            .get(&deployment.class_id)
            .ok_or(LedgerError::UnknownContractClass(deployment.class_id))?;
        let expected = compute_contract_address(
            &deployment.class_id,
            &deployment.salt,
            &deployment.constructor_args_hash,
        );
        let constructor = contract
            .class()
            .constructor()
            .map(umbra_core::abi::FunctionAbi::selector);
        if tx.to != expected
            || tx.args_hash != deployment.constructor_args_hash
            || tx.function_data.kind != FunctionKind::Constructor
            || constructor != Some(tx.function_data.selector)
        {
            return Err(LedgerError::InvalidDeployment(tx.to));
        }

        state.deploy(
            tx.to,
            ContractInstance {
                class_id: deployment.class_id,
            },
        )?;
        let context = CallContext {
            contract: tx.to,
            origin: tx.origin,
        };
        let output = contract.construct(&context, args, rng)?;
        apply_output(state, output, effect)?;
        debug!(contract = %tx.to, class = %deployment.class_id, "Deployed contract");
        Ok(())
    }

    fn call(
        &self,
        state: &mut LedgerState,
        origin: Address,
        call: &Call<'_>,
        effect: &mut TxEffect,
        rng: &mut dyn RngCore,
    ) -> Result<(), LedgerError> {
        let instance = state
            .contract(&call.to)
            .ok_or(LedgerError::ContractNotFound(call.to))?;
        let contract = self
            .registry
            .get(&instance.class_id)
            .ok_or(LedgerError::UnknownContractClass(instance.class_id))?;
        if call.function_data.kind != FunctionKind::Private {
            return Err(ContractError::NotCallable(call.function_data.selector).into());
        }
        let context = CallContext {
            contract: call.to,
            origin,
        };
        let notes = state.live_notes(&call.to);
        let output = contract.call(
            &context,
            &call.function_data.selector,
            call.args,
            &notes,
            rng,
        )?;
        apply_output(state, output, effect)
    }
}

fn apply_output(
    state: &mut LedgerState,
    output: ContractOutput,
    effect: &mut TxEffect,
) -> Result<(), LedgerError> {
    for commitment in &output.consumed {
        effect.nullifiers.push(state.consume_note(commitment)?);
    }
    for emission in output.emissions {
        let log = EncryptedLog::encrypt(&emission.payload, &emission.recipient)?;
        effect.note_commitments.push(state.insert_note(emission.payload));
        effect.encrypted_logs.push(log);
    }
    Ok(())
}
