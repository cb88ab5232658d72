use serde::{Deserialize, Serialize};

use crate::{
    crypto::{hash_fields, Fr, BLOCK_DOMAIN},
    logs::EncryptedLog,
    tx::TxHash,
};

pub type BlockNumber = u64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub Fr);

impl core::fmt::Display for BlockId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State changes of one mined transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxEffect {
    pub tx_hash: TxHash,
    pub note_commitments: Vec<Fr>,
    pub nullifiers: Vec<Fr>,
    pub encrypted_logs: Vec<EncryptedLog>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: BlockNumber,
    pub id: BlockId,
    pub parent: BlockId,
    pub effects: Vec<TxEffect>,
}

impl Block {
    #[must_use]
    pub fn new(number: BlockNumber, parent: BlockId, effects: Vec<TxEffect>) -> Self {
        let mut preimage = vec![Fr::from(number), parent.0];
        preimage.extend(effects.iter().map(|effect| effect.tx_hash.0));
        Self {
            number,
            id: BlockId(hash_fields(BLOCK_DOMAIN, &preimage)),
            parent,
            effects,
        }
    }

    #[must_use]
    pub fn encrypted_log_count(&self) -> usize {
        self.effects
            .iter()
            .map(|effect| effect.encrypted_logs.len())
            .sum()
    }

    pub fn encrypted_logs(&self) -> impl Iterator<Item = &EncryptedLog> {
        self.effects
            .iter()
            .flat_map(|effect| effect.encrypted_logs.iter())
    }

    pub fn nullifiers(&self) -> impl Iterator<Item = &Fr> {
        self.effects.iter().flat_map(|effect| effect.nullifiers.iter())
    }
}
