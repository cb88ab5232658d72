use rpds::{HashTrieMapSync, HashTrieSetSync};
use umbra_core::{
    contracts::ContractClassId, crypto::Fr, logs::NotePayload, tx::TxHash, Address,
};

use crate::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractInstance {
    pub class_id: ContractClassId,
}

/// Confidential state: deployed contracts, live notes and spent nullifiers.
///
/// Persistent maps make every applied transaction a cheap new version, so a
/// failing transaction simply drops its working copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerState {
    contracts: HashTrieMapSync<Address, ContractInstance>,
    live_notes: HashTrieMapSync<Fr, NotePayload>,
    commitments: HashTrieSetSync<Fr>,
    nullifiers: HashTrieSetSync<Fr>,
    txs: HashTrieSetSync<TxHash>,
}

impl LedgerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contract(&self, address: &Address) -> Option<&ContractInstance> {
        self.contracts.get(address)
    }

    #[must_use]
    pub fn contains_tx(&self, tx_hash: &TxHash) -> bool {
        self.txs.contains(tx_hash)
    }

    #[must_use]
    pub fn is_nullified(&self, nullifier: &Fr) -> bool {
        self.nullifiers.contains(nullifier)
    }

    #[must_use]
    pub fn has_commitment(&self, commitment: &Fr) -> bool {
        self.commitments.contains(commitment)
    }

    /// Live notes of a contract, in no particular order.
    #[must_use]
    pub fn live_notes(&self, contract: &Address) -> Vec<NotePayload> {
        self.live_notes
            .values()
            .filter(|payload| payload.contract == *contract)
            .cloned()
            .collect()
    }

    pub(crate) fn record_tx(&mut self, tx_hash: TxHash) {
        self.txs.insert_mut(tx_hash);
    }

    pub(crate) fn deploy(
        &mut self,
        address: Address,
        instance: ContractInstance,
    ) -> Result<(), LedgerError> {
        if self.contracts.contains_key(&address) {
            return Err(LedgerError::ContractAlreadyDeployed(address));
        }
        self.contracts.insert_mut(address, instance);
        Ok(())
    }

    pub(crate) fn insert_note(&mut self, payload: NotePayload) -> Fr {
        let commitment = payload.commitment();
        self.commitments.insert_mut(commitment);
        self.live_notes.insert_mut(commitment, payload);
        commitment
    }

    /// Spends a live note and returns its nullifier.
    pub(crate) fn consume_note(&mut self, commitment: &Fr) -> Result<Fr, LedgerError> {
        let payload = self
            .live_notes
            .get(commitment)
            .ok_or(LedgerError::NoteNotFound(*commitment))?;
        let nullifier = payload.nullifier();
        if self.nullifiers.contains(&nullifier) {
            return Err(LedgerError::DoubleSpend(nullifier));
        }
        self.live_notes.remove_mut(commitment);
        self.nullifiers.insert_mut(nullifier);
        Ok(nullifier)
    }
}

#[cfg(test)]
mod tests {
    use umbra_core::logs::Note;

    use super::*;

    fn payload(contract: u64, value: u64) -> NotePayload {
        NotePayload {
            contract: Address::new(Fr::from(contract)),
            storage_slot: Fr::ONE,
            note: Note::new(vec![Fr::from(value)], Fr::from(value + 1000)),
        }
    }

    #[test]
    fn consuming_moves_a_note_to_the_nullifier_set() {
        let mut state = LedgerState::new();
        let note = payload(1, 5);
        let commitment = state.insert_note(note.clone());
        let before = state.clone();

        let nullifier = state.consume_note(&commitment).unwrap();
        assert_eq!(nullifier, note.nullifier());
        assert!(state.is_nullified(&nullifier));
        assert!(state.has_commitment(&commitment));
        assert!(state.live_notes(&note.contract).is_empty());
        assert_eq!(
            state.consume_note(&commitment),
            Err(LedgerError::NoteNotFound(commitment))
        );

        // Older versions are untouched.
        assert_eq!(before.live_notes(&note.contract), vec![note]);
    }

    #[test]
    fn live_notes_are_scoped_per_contract() {
        let mut state = LedgerState::new();
        state.insert_note(payload(1, 5));
        state.insert_note(payload(2, 6));
        assert_eq!(state.live_notes(&Address::new(Fr::from(1u64))).len(), 1);
    }

    #[test]
    fn contracts_deploy_once() {
        let mut state = LedgerState::new();
        let address = Address::new(Fr::from(3u64));
        let instance = ContractInstance {
            class_id: ContractClassId::new(Fr::ONE),
        };
        state.deploy(address, instance).unwrap();
        assert_eq!(
            state.deploy(address, instance),
            Err(LedgerError::ContractAlreadyDeployed(address))
        );
    }
}
