use serde::{Deserialize, Serialize};

use super::{ExecutionRequest, TxContext};

/// Unauthenticated bundle of executions sharing one transaction context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionDescriptor {
    pub executions: Vec<ExecutionRequest>,
    pub tx_context: TxContext,
}

#[derive(Debug, Clone)]
pub struct ExecutionRequestBuilder {
    descriptor: ExecutionDescriptor,
}

impl ExecutionRequestBuilder {
    #[must_use]
    pub const fn new(tx_context: TxContext) -> Self {
        Self {
            descriptor: ExecutionDescriptor {
                executions: vec![],
                tx_context,
            },
        }
    }

    #[must_use]
    pub fn push_execution(self, execution: ExecutionRequest) -> Self {
        self.extend_executions([execution])
    }

    #[must_use]
    pub fn extend_executions(
        mut self,
        executions: impl IntoIterator<Item = ExecutionRequest>,
    ) -> Self {
        self.descriptor.executions.extend(executions);
        self
    }

    #[must_use]
    pub fn build(self) -> ExecutionDescriptor {
        self.descriptor
    }
}
