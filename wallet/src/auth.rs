//! Turning execution descriptors into authenticated requests.
use rand::rngs::OsRng;
use umbra_core::{
    circuit::CircuitContext,
    crypto::{Fr, PublicKey},
    packing::PackedArguments,
    tx::{
        entrypoint::{entrypoint_function_data, EntrypointCall, EntrypointPayload},
        Authorization, ExecutionDescriptor, TxExecutionRequest,
    },
    Address,
};

use crate::{error::AuthenticationError, AccountMode, Kms, RegistrationInfo, WalletError};

/// How requests originating from an account are authenticated, picked from
/// the mode the account was registered with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Authenticator {
    /// Wraps the executions in an entrypoint call to the account itself and
    /// signs the request with the account key.
    Signing {
        address: Address,
        public_key: PublicKey,
    },
    /// Sends a single execution with no authorization.
    Signerless { address: Address },
}

impl Authenticator {
    #[must_use]
    pub const fn for_registration(registration: &RegistrationInfo<Address, PublicKey>) -> Self {
        match registration.mode {
            AccountMode::Signing => Self::Signing {
                address: registration.key_id,
                public_key: registration.public_key,
            },
            AccountMode::Signerless => Self::Signerless {
                address: registration.key_id,
            },
        }
    }

    #[must_use]
    pub const fn address(&self) -> Address {
        match self {
            Self::Signing { address, .. } | Self::Signerless { address } => *address,
        }
    }

    pub async fn authenticate(
        &self,
        descriptor: ExecutionDescriptor,
        circuit: &CircuitContext,
        kms: &Kms,
    ) -> Result<TxExecutionRequest, WalletError> {
        if descriptor.executions.is_empty() {
            return Err(AuthenticationError::Empty.into());
        }
        match self {
            Self::Signing {
                address,
                public_key,
            } => Self::signed(*address, *public_key, descriptor, circuit, kms).await,
            Self::Signerless { address } => Self::signerless(*address, descriptor, circuit),
        }
    }

    fn signerless(
        origin: Address,
        descriptor: ExecutionDescriptor,
        circuit: &CircuitContext,
    ) -> Result<TxExecutionRequest, WalletError> {
        let ExecutionDescriptor {
            mut executions,
            tx_context,
        } = descriptor;
        if executions.len() != 1 {
            return Err(WalletError::UnsupportedBatch {
                origin,
                count: executions.len(),
            });
        }
        let Some(execution) = executions.pop() else {
            return Err(AuthenticationError::Empty.into());
        };
        let packed = PackedArguments::from_args(execution.args, circuit)
            .map_err(AuthenticationError::from)?;
        Ok(TxExecutionRequest {
            origin,
            to: execution.to,
            function_data: execution.function_data,
            args_hash: packed.hash(),
            tx_context,
            packed_arguments: vec![packed],
            salt: Fr::random(&mut OsRng),
            authorization: None,
        })
    }

    async fn signed(
        origin: Address,
        public_key: PublicKey,
        descriptor: ExecutionDescriptor,
        circuit: &CircuitContext,
        kms: &Kms,
    ) -> Result<TxExecutionRequest, WalletError> {
        let registration = kms.lookup(origin).await?;
        if registration.mode != AccountMode::Signing {
            return Err(WalletError::UnknownAccount(origin));
        }

        let mut packed_arguments = Vec::with_capacity(descriptor.executions.len() + 1);
        let mut calls = Vec::with_capacity(descriptor.executions.len());
        for execution in descriptor.executions {
            let packed = PackedArguments::from_args(execution.args, circuit)
                .map_err(AuthenticationError::from)?;
            calls.push(EntrypointCall {
                to: execution.to,
                function_data: execution.function_data,
                args_hash: packed.hash(),
            });
            packed_arguments.push(packed);
        }
        let payload = EntrypointPayload::new(calls, Fr::random(&mut OsRng))
            .map_err(AuthenticationError::from)?;
        let payload = PackedArguments::from_args(payload.to_fields(), circuit)
            .map_err(AuthenticationError::from)?;

        let mut request = TxExecutionRequest {
            origin,
            to: origin,
            function_data: entrypoint_function_data(),
            args_hash: payload.hash(),
            tx_context: descriptor.tx_context,
            packed_arguments: Vec::new(),
            salt: Fr::random(&mut OsRng),
            authorization: None,
        };
        request.packed_arguments.push(payload);
        request.packed_arguments.extend(packed_arguments);

        let signature = kms
            .sign(origin, request.signing_hash())
            .await
            .map_err(AuthenticationError::Signing)?;
        request.authorization = Some(Authorization {
            public_key,
            signature,
        });
        Ok(request)
    }
}
