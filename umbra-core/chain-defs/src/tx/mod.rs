mod builder;
pub mod entrypoint;

pub use builder::{ExecutionDescriptor, ExecutionRequestBuilder};
use serde::{Deserialize, Serialize};

use crate::{
    address::Address,
    contracts::ContractClassId,
    crypto::{hash_bytes, hash_fields, Fr, PublicKey, Signature, SELECTOR_DOMAIN, TX_DOMAIN},
    packing::PackedArguments,
};

/// The hash of a transaction
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TxHash(pub Fr);

impl From<Fr> for TxHash {
    fn from(fr: Fr) -> Self {
        Self(fr)
    }
}

impl From<TxHash> for Fr {
    fn from(hash: TxHash) -> Self {
        hash.0
    }
}

impl core::fmt::Display for TxHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionSelector([u8; 4]);

impl FunctionSelector {
    #[must_use]
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn from_signature(signature: &str) -> Self {
        let digest = hash_bytes(SELECTOR_DOMAIN, &[signature.as_bytes()]);
        Self([digest[0], digest[1], digest[2], digest[3]])
    }

    #[must_use]
    pub const fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn from_field(fr: &Fr) -> Option<Self> {
        fr.to_u64()
            .and_then(|value| u32::try_from(value).ok())
            .map(|value| Self(value.to_be_bytes()))
    }

    #[must_use]
    pub fn to_field(&self) -> Fr {
        Fr::from(u64::from(self.to_u32()))
    }
}

impl core::fmt::Display for FunctionSelector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:08x}", self.to_u32())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    Private,
    /// Evaluated locally by the wallet; never part of a transaction.
    Unconstrained,
    Constructor,
}

impl FunctionKind {
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        match self {
            Self::Private => 0,
            Self::Unconstrained => 1,
            Self::Constructor => 2,
        }
    }

    #[must_use]
    pub const fn from_u64(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Private),
            1 => Some(Self::Unconstrained),
            2 => Some(Self::Constructor),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionData {
    pub selector: FunctionSelector,
    pub kind: FunctionKind,
}

impl FunctionData {
    #[must_use]
    pub const fn new(selector: FunctionSelector, kind: FunctionKind) -> Self {
        Self { selector, kind }
    }

    #[must_use]
    pub fn as_signing_frs(&self) -> [Fr; 2] {
        [self.selector.to_field(), Fr::from(self.kind.as_u64())]
    }
}

/// One intended function call, with its arguments already encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub to: Address,
    pub function_data: FunctionData,
    pub args: Vec<Fr>,
}

impl ExecutionRequest {
    #[must_use]
    pub const fn new(to: Address, function_data: FunctionData, args: Vec<Fr>) -> Self {
        Self {
            to,
            function_data,
            args,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDeploymentData {
    pub class_id: ContractClassId,
    pub salt: Fr,
    pub constructor_args_hash: Fr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    pub chain_id: u64,
    pub version: u32,
    pub max_fee: u64,
    pub deployment: Option<ContractDeploymentData>,
}

impl TxContext {
    #[must_use]
    pub const fn new(chain_id: u64, version: u32) -> Self {
        Self {
            chain_id,
            version,
            max_fee: 0,
            deployment: None,
        }
    }

    #[must_use]
    pub const fn with_max_fee(mut self, max_fee: u64) -> Self {
        self.max_fee = max_fee;
        self
    }

    #[must_use]
    pub const fn with_deployment(mut self, deployment: ContractDeploymentData) -> Self {
        self.deployment = Some(deployment);
        self
    }

    #[must_use]
    pub fn as_signing_frs(&self) -> Vec<Fr> {
        let mut output = vec![
            Fr::from(self.chain_id),
            Fr::from(u64::from(self.version)),
            Fr::from(self.max_fee),
        ];
        match &self.deployment {
            Some(deployment) => output.extend([
                Fr::ONE,
                deployment.class_id.to_field(),
                deployment.salt,
                deployment.constructor_args_hash,
            ]),
            None => output.push(Fr::ZERO),
        }
        output
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub public_key: PublicKey,
    pub signature: Signature,
}

/// Authenticated, submittable unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxExecutionRequest {
    pub origin: Address,
    pub to: Address,
    pub function_data: FunctionData,
    pub args_hash: Fr,
    pub tx_context: TxContext,
    /// Every argument set the execution touches, the top level one included.
    pub packed_arguments: Vec<PackedArguments>,
    /// Random value so that identical intents hash differently.
    pub salt: Fr,
    pub authorization: Option<Authorization>,
}

impl TxExecutionRequest {
    /// Everything an authorization commits to. Raw arguments are only bound
    /// through their hash.
    #[must_use]
    pub fn as_signing_frs(&self) -> Vec<Fr> {
        let mut output = vec![self.origin.to_field(), self.to.to_field()];
        output.extend(self.function_data.as_signing_frs());
        output.push(self.args_hash);
        output.extend(self.tx_context.as_signing_frs());
        output.push(self.salt);
        output
    }

    #[must_use]
    pub fn signing_hash(&self) -> Fr {
        hash_fields(TX_DOMAIN, &self.as_signing_frs())
    }

    #[must_use]
    pub fn hash(&self) -> TxHash {
        TxHash(self.signing_hash())
    }

    #[must_use]
    pub fn find_packed(&self, hash: &Fr) -> Option<&PackedArguments> {
        self.packed_arguments
            .iter()
            .find(|packed| packed.hash() == *hash)
    }

    #[must_use]
    pub fn is_deployment(&self) -> bool {
        self.tx_context.deployment.is_some()
    }
}
