use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    abi::{encode_arguments, AbiValue, FunctionAbi},
    circuit::CircuitContext,
    crypto::{hash_fields, FieldError, Fr, ARGS_DOMAIN},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackingError {
    #[error("Function `{function}` expects {expected} arguments, got {actual}")]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },
    #[error("Argument `{param}` expects a value of type {expected}")]
    TypeMismatch { param: String, expected: String },
    #[error("Argument `{param}` does not fit in {width} bits")]
    IntegerOverflow { param: String, width: u8 },
    #[error("Argument `{param}` expects {expected} elements, got {actual}")]
    ArrayLengthMismatch {
        param: String,
        expected: usize,
        actual: usize,
    },
    #[error("Unsupported argument type {0}")]
    UnsupportedType(String),
    #[error("Packed arguments exceed the circuit limit: {len} > {max}")]
    TooManyArguments { len: usize, max: usize },
    #[error(transparent)]
    NonCanonicalField(#[from] FieldError),
}

/// Flat argument encoding together with its binding hash.
///
/// The hash covers the circuit version, the length and every element, so it
/// is the only thing authorizations need to commit to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedArguments {
    hash: Fr,
    circuit_version: u32,
    fields: Vec<Fr>,
}

impl PackedArguments {
    pub fn from_args(fields: Vec<Fr>, context: &CircuitContext) -> Result<Self, PackingError> {
        if fields.len() > context.max_args {
            return Err(PackingError::TooManyArguments {
                len: fields.len(),
                max: context.max_args,
            });
        }
        Ok(Self {
            hash: compute_args_hash(&fields, context.version),
            circuit_version: context.version,
            fields,
        })
    }

    #[must_use]
    pub const fn hash(&self) -> Fr {
        self.hash
    }

    #[must_use]
    pub const fn circuit_version(&self) -> u32 {
        self.circuit_version
    }

    #[must_use]
    pub fn fields(&self) -> &[Fr] {
        &self.fields
    }

    /// Whether the carried hash matches the carried fields.
    #[must_use]
    pub fn verify(&self) -> bool {
        compute_args_hash(&self.fields, self.circuit_version) == self.hash
    }
}

#[must_use]
pub fn compute_args_hash(fields: &[Fr], circuit_version: u32) -> Fr {
    let header = [
        Fr::from(u64::from(circuit_version)),
        Fr::from(fields.len() as u64),
    ];
    let preimage: Vec<Fr> = header.iter().chain(fields).copied().collect();
    hash_fields(ARGS_DOMAIN, &preimage)
}

/// Encodes typed values against a function ABI and packs the result.
pub fn pack(
    abi: &FunctionAbi,
    values: &[AbiValue],
    context: &CircuitContext,
) -> Result<PackedArguments, PackingError> {
    PackedArguments::from_args(encode_arguments(abi, values)?, context)
}
