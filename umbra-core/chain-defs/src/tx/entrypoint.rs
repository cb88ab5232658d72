//! Payload an account entrypoint executes on behalf of its owner.
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FunctionData, FunctionKind, FunctionSelector};
use crate::{address::Address, crypto::Fr};

pub const MAX_ENTRYPOINT_CALLS: usize = 4;
const CALL_FIELDS: usize = 4;

pub static ENTRYPOINT_SELECTOR: LazyLock<FunctionSelector> =
    LazyLock::new(|| FunctionSelector::from_signature("entrypoint(payload)"));

#[must_use]
pub fn entrypoint_function_data() -> FunctionData {
    FunctionData::new(*ENTRYPOINT_SELECTOR, FunctionKind::Private)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntrypointError {
    #[error("Entrypoint payload has no calls")]
    Empty,
    #[error("Entrypoint payload has {0} calls, at most {MAX_ENTRYPOINT_CALLS} are allowed")]
    TooManyCalls(usize),
    #[error("Malformed entrypoint payload")]
    Malformed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrypointCall {
    pub to: Address,
    pub function_data: FunctionData,
    pub args_hash: Fr,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrypointPayload {
    pub calls: Vec<EntrypointCall>,
    pub nonce: Fr,
}

impl EntrypointPayload {
    pub fn new(calls: Vec<EntrypointCall>, nonce: Fr) -> Result<Self, EntrypointError> {
        if calls.is_empty() {
            return Err(EntrypointError::Empty);
        }
        if calls.len() > MAX_ENTRYPOINT_CALLS {
            return Err(EntrypointError::TooManyCalls(calls.len()));
        }
        Ok(Self { calls, nonce })
    }

    /// `[len, (to, selector, kind, args_hash)*, nonce]`
    #[must_use]
    pub fn to_fields(&self) -> Vec<Fr> {
        let mut output = Vec::with_capacity(2 + CALL_FIELDS * self.calls.len());
        output.push(Fr::from(self.calls.len() as u64));
        for call in &self.calls {
            output.push(call.to.to_field());
            output.extend(call.function_data.as_signing_frs());
            output.push(call.args_hash);
        }
        output.push(self.nonce);
        output
    }

    pub fn from_fields(fields: &[Fr]) -> Result<Self, EntrypointError> {
        let (len, rest) = fields.split_first().ok_or(EntrypointError::Malformed)?;
        let len = len
            .to_u64()
            .and_then(|len| usize::try_from(len).ok())
            .ok_or(EntrypointError::Malformed)?;
        if len > MAX_ENTRYPOINT_CALLS {
            return Err(EntrypointError::TooManyCalls(len));
        }
        if rest.len() != len * CALL_FIELDS + 1 {
            return Err(EntrypointError::Malformed);
        }
        let (calls, nonce) = rest.split_at(len * CALL_FIELDS);
        let calls = calls
            .chunks_exact(CALL_FIELDS)
            .map(|call| {
                let selector =
                    FunctionSelector::from_field(&call[1]).ok_or(EntrypointError::Malformed)?;
                let kind = call[2]
                    .to_u64()
                    .and_then(FunctionKind::from_u64)
                    .ok_or(EntrypointError::Malformed)?;
                Ok(EntrypointCall {
                    to: Address::new(call[0]),
                    function_data: FunctionData::new(selector, kind),
                    args_hash: call[3],
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(calls, nonce[0])
    }
}
