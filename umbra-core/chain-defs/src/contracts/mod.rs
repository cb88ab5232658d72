//! Contract classes and the rules the ledger runs for them.
pub mod pokeable_token;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    abi::FunctionAbi,
    address::Address,
    crypto::{hash_bytes, hash_fields, Fr, PublicKey, CONTRACT_ADDRESS_DOMAIN},
    logs::NotePayload,
    packing::PackingError,
    tx::{FunctionKind, FunctionSelector},
};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContractClassId(Fr);

impl ContractClassId {
    #[must_use]
    pub const fn new(fr: Fr) -> Self {
        Self(fr)
    }

    #[must_use]
    pub const fn to_field(&self) -> Fr {
        self.0
    }
}

impl core::fmt::Display for ContractClassId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Published interface of a contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractClass {
    pub name: String,
    pub functions: Vec<FunctionAbi>,
}

impl ContractClass {
    #[must_use]
    pub fn id(&self) -> ContractClassId {
        let signatures: Vec<String> = self.functions.iter().map(FunctionAbi::signature).collect();
        let mut chunks: Vec<&[u8]> = vec![b"class", self.name.as_bytes()];
        chunks.extend(signatures.iter().map(String::as_bytes));
        ContractClassId(Fr::from_digest(hash_bytes(CONTRACT_ADDRESS_DOMAIN, &chunks)))
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FunctionAbi> {
        self.functions.iter().find(|function| function.name == name)
    }

    #[must_use]
    pub fn function_by_selector(&self, selector: &FunctionSelector) -> Option<&FunctionAbi> {
        self.functions
            .iter()
            .find(|function| function.selector() == *selector)
    }

    #[must_use]
    pub fn constructor(&self) -> Option<&FunctionAbi> {
        self.functions
            .iter()
            .find(|function| function.kind == FunctionKind::Constructor)
    }
}

#[must_use]
pub fn compute_contract_address(
    class_id: &ContractClassId,
    salt: &Fr,
    constructor_args_hash: &Fr,
) -> Address {
    Address::new(hash_fields(
        CONTRACT_ADDRESS_DOMAIN,
        &[class_id.0, *salt, *constructor_args_hash],
    ))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Function {0} does not exist")]
    UnknownFunction(FunctionSelector),
    #[error("Function {0} cannot be called in a transaction")]
    NotCallable(FunctionSelector),
    #[error(transparent)]
    InvalidArguments(#[from] PackingError),
    #[error("Malformed arguments: {0}")]
    MalformedArguments(String),
    #[error("Contract state is missing {0}")]
    MissingState(&'static str),
    #[error("Balance overflow")]
    Overflow,
}

/// A note created by a call, and the key it must be encrypted to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteEmission {
    pub payload: NotePayload,
    pub recipient: PublicKey,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractOutput {
    pub emissions: Vec<NoteEmission>,
    /// Commitments of the notes consumed by the call.
    pub consumed: Vec<Fr>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub contract: Address,
    pub origin: Address,
}

/// Rules of a private contract class, as executed by the ledger.
///
/// `notes` holds the live (not yet consumed) notes of the called instance.
pub trait PrivateContract: Send + Sync {
    fn class(&self) -> &ContractClass;

    fn construct(
        &self,
        context: &CallContext,
        args: &[Fr],
        rng: &mut dyn rand::RngCore,
    ) -> Result<ContractOutput, ContractError>;

    fn call(
        &self,
        context: &CallContext,
        selector: &FunctionSelector,
        args: &[Fr],
        notes: &[NotePayload],
        rng: &mut dyn rand::RngCore,
    ) -> Result<ContractOutput, ContractError>;
}
