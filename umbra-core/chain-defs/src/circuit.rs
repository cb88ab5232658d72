use serde::{Deserialize, Serialize};

pub const DEFAULT_CIRCUIT_VERSION: u32 = 1;
pub const DEFAULT_MAX_ARGS: usize = 64;

/// Parameters of the proving backend that argument packing depends on.
///
/// Published by the node, opaque to everything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitContext {
    pub version: u32,
    pub max_args: usize,
}

impl Default for CircuitContext {
    fn default() -> Self {
        Self {
            version: DEFAULT_CIRCUIT_VERSION,
            max_args: DEFAULT_MAX_ARGS,
        }
    }
}
