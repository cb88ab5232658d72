mod execution;
mod registry;
mod state;

use serde::{Deserialize, Serialize};
use umbra_core::{
    circuit::CircuitContext,
    contracts::{ContractClassId, ContractError},
    crypto::{EncryptionError, Fr},
    tx::{entrypoint::EntrypointError, TxHash},
    Address,
};

pub use crate::{
    execution::AppliedTx,
    registry::ContractRegistry,
    state::{ContractInstance, LedgerState},
};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Transaction targets chain {chain_id} version {version}, expected chain {expected_chain_id} version {expected_version}")]
    InvalidTxContext {
        chain_id: u64,
        version: u32,
        expected_chain_id: u64,
        expected_version: u32,
    },
    #[error("Transaction {0} was already included")]
    DuplicateTx(TxHash),
    #[error("Packed arguments {hash} do not match their contents or circuit version")]
    InvalidPackedArguments { hash: Fr },
    #[error("No packed arguments for hash {0}")]
    MissingArguments(Fr),
    #[error("Invalid authorization signature")]
    InvalidSignature,
    #[error("Authorization key belongs to {signer}, not to origin {origin}")]
    OriginMismatch { origin: Address, signer: Address },
    #[error("Entrypoint of {0} called without authorization")]
    Unauthorized(Address),
    #[error(transparent)]
    Entrypoint(#[from] EntrypointError),
    #[error("Unknown contract class {0}")]
    UnknownContractClass(ContractClassId),
    #[error("Deployment data does not match target {0}")]
    InvalidDeployment(Address),
    #[error("Contract {0} is already deployed")]
    ContractAlreadyDeployed(Address),
    #[error("No contract deployed at {0}")]
    ContractNotFound(Address),
    #[error("Execution failed: {0}")]
    Execution(#[from] ContractError),
    #[error("Note {0} is not live")]
    NoteNotFound(Fr),
    #[error("Nullifier {0} already spent")]
    DoubleSpend(Fr),
    #[error("Failed to encrypt log: {0}")]
    Encryption(String),
}

impl From<EncryptionError> for LedgerError {
    fn from(error: EncryptionError) -> Self {
        Self::Encryption(error.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub chain_id: u64,
    pub version: u32,
    pub circuit: CircuitContext,
}

/// Rules for turning execution requests into state transitions.
#[derive(Clone, Debug)]
pub struct Ledger {
    config: LedgerConfig,
    registry: ContractRegistry,
}

impl Ledger {
    #[must_use]
    pub const fn new(config: LedgerConfig, registry: ContractRegistry) -> Self {
        Self { config, registry }
    }

    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    #[must_use]
    pub const fn registry(&self) -> &ContractRegistry {
        &self.registry
    }
}
