use std::time::Duration;

use key_management_system::{api::KmsApiError, backend::preload::PreloadBackendError};
use thiserror::Error;
use umbra_core::{
    contracts::ContractError,
    packing::PackingError,
    tx::{entrypoint::EntrypointError, TxHash},
    Address,
};
use umbra_node::{NodeError, SubmissionError};

use crate::tx::TxLifecycle;

pub type KmsError = KmsApiError<PreloadBackendError>;

#[derive(Error, Debug)]
pub enum AuthenticationError {
    #[error("Execution descriptor has no executions")]
    Empty,
    #[error(transparent)]
    Packing(#[from] PackingError),
    #[error(transparent)]
    Entrypoint(#[from] EntrypointError),
    #[error("Could not sign the request: {0}")]
    Signing(#[source] KmsError),
}

#[derive(Error, Debug)]
pub enum WalletError {
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
    #[error("Account {0} is not registered")]
    UnknownAccount(Address),
    #[error("Signerless account {origin} sends a single execution per request, got {count}")]
    UnsupportedBatch { origin: Address, count: usize },
    #[error("Conflicting registration: {0}")]
    ConflictingRegistration(#[source] PreloadBackendError),
    #[error(transparent)]
    Kms(KmsError),
    #[error(transparent)]
    Packing(#[from] PackingError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error("Transaction {tx_hash} was rejected: {reason}")]
    Rejected { tx_hash: TxHash, reason: String },
    #[error("Transaction {tx_hash} was not mined after {elapsed:?}")]
    Timeout { tx_hash: TxHash, elapsed: Duration },
    #[error("Account {address} did not synchronise after {attempts} attempts in {elapsed:?}")]
    SyncTimeout {
        address: Address,
        attempts: u32,
        elapsed: Duration,
    },
    #[error("Transaction {tx_hash} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        tx_hash: TxHash,
        from: TxLifecycle,
        to: TxLifecycle,
    },
    #[error("{caller} cannot read private state of {owner}")]
    AccessDenied { owner: Address, caller: Address },
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("Contract class {0} has no constructor")]
    NoConstructor(String),
    #[error("Mined deployment {0} carries no contract address")]
    MissingContractAddress(TxHash),
}

impl From<KmsError> for WalletError {
    fn from(error: KmsError) -> Self {
        match error {
            KmsApiError::Backend(PreloadBackendError::KeyNotRegistered(address)) => {
                Self::UnknownAccount(address)
            }
            KmsApiError::Backend(
                e @ (PreloadBackendError::ConflictingRegistration { .. }
                | PreloadBackendError::ConflictingKey(_)),
            ) => Self::ConflictingRegistration(e),
            e => Self::Kms(e),
        }
    }
}
