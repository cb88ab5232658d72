use serde::{Deserialize, Serialize};

use crate::{address::Address, block::BlockNumber, tx::TxHash};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    Pending,
    Mined,
    Dropped,
}

impl TxStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Mined | Self::Dropped)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub status: TxStatus,
    pub error: Option<String>,
    pub block_number: Option<BlockNumber>,
    /// Set for deployments.
    pub contract_address: Option<Address>,
}

impl TxReceipt {
    #[must_use]
    pub const fn pending(tx_hash: TxHash) -> Self {
        Self {
            tx_hash,
            status: TxStatus::Pending,
            error: None,
            block_number: None,
            contract_address: None,
        }
    }

    #[must_use]
    pub const fn mined(
        tx_hash: TxHash,
        block_number: BlockNumber,
        contract_address: Option<Address>,
    ) -> Self {
        Self {
            tx_hash,
            status: TxStatus::Mined,
            error: None,
            block_number: Some(block_number),
            contract_address,
        }
    }

    #[must_use]
    pub fn dropped(tx_hash: TxHash, error: impl Into<String>) -> Self {
        Self {
            tx_hash,
            status: TxStatus::Dropped,
            error: Some(error.into()),
            block_number: None,
            contract_address: None,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
