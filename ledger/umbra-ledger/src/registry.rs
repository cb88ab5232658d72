use std::{collections::HashMap, sync::Arc};

use umbra_core::contracts::{pokeable_token::PokeableToken, ContractClassId, PrivateContract};

/// Contract classes the ledger knows how to execute.
#[derive(Clone, Default)]
pub struct ContractRegistry {
    classes: HashMap<ContractClassId, Arc<dyn PrivateContract>>,
}

impl ContractRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in class.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PokeableToken));
        registry
    }

    pub fn register(&mut self, contract: Arc<dyn PrivateContract>) -> ContractClassId {
        let id = contract.class().id();
        self.classes.insert(id, contract);
        id
    }

    #[must_use]
    pub fn get(&self, id: &ContractClassId) -> Option<&Arc<dyn PrivateContract>> {
        self.classes.get(id)
    }
}

impl core::fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContractRegistry")
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .finish()
    }
}
