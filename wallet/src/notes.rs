use rpds::{HashTrieMapSync, HashTrieSetSync};
use umbra_core::{crypto::Fr, logs::NotePayload, Address};

/// Decrypted notes, indexed by the account whose key decrypted them.
///
/// Notes are keyed by nullifier so spending them is a single lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
struct StoredNote {
    viewer: Address,
    payload: NotePayload,
}

#[derive(Clone, Debug, Default)]
pub struct NoteStore {
    notes: HashTrieMapSync<Fr, StoredNote>,
    viewer_index: HashTrieMapSync<Address, HashTrieSetSync<Fr>>,
    spent: HashTrieSetSync<Fr>,
}

impl NoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a note decrypted by `viewer`, unless it was already spent.
    #[must_use]
    pub fn insert(&self, viewer: Address, payload: NotePayload) -> Self {
        let nullifier = payload.nullifier();
        if self.spent.contains(&nullifier) {
            return self.clone();
        }
        let viewer_notes = self
            .viewer_index
            .get(&viewer)
            .cloned()
            .unwrap_or_else(HashTrieSetSync::new_sync)
            .insert(nullifier);
        Self {
            notes: self.notes.insert(nullifier, StoredNote { viewer, payload }),
            viewer_index: self.viewer_index.insert(viewer, viewer_notes),
            spent: self.spent.clone(),
        }
    }

    /// Drops every note matching one of `nullifiers` and remembers them, so
    /// accounts catching up later do not resurrect them.
    #[must_use]
    pub fn nullify<'a>(&self, nullifiers: impl IntoIterator<Item = &'a Fr>) -> Self {
        let mut notes = self.notes.clone();
        let mut viewer_index = self.viewer_index.clone();
        let mut spent = self.spent.clone();

        for nullifier in nullifiers {
            spent = spent.insert(*nullifier);
            let Some(stored) = notes.get(nullifier) else {
                continue;
            };
            let viewer = stored.viewer;
            notes = notes.remove(nullifier);

            if let Some(set) = viewer_index.get(&viewer) {
                let updated = set.remove(nullifier);
                viewer_index = if updated.is_empty() {
                    viewer_index.remove(&viewer)
                } else {
                    viewer_index.insert(viewer, updated)
                };
            }
        }

        Self {
            notes,
            viewer_index,
            spent,
        }
    }

    /// Unspent notes of `contract` readable by `viewer`.
    #[must_use]
    pub fn notes_of(&self, viewer: &Address, contract: &Address) -> Vec<NotePayload> {
        self.viewer_index
            .get(viewer)
            .into_iter()
            .flatten()
            .filter_map(|nullifier| self.notes.get(nullifier))
            .map(|stored| &stored.payload)
            .filter(|payload| payload.contract == *contract)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use umbra_core::logs::Note;

    use super::*;

    fn note(contract: u64, value: u64) -> NotePayload {
        NotePayload {
            contract: Address::new(Fr::from(contract)),
            storage_slot: Fr::ONE,
            note: Note::new(vec![Fr::from(value)], Fr::from(value + 100)),
        }
    }

    #[test]
    fn notes_are_scoped_to_viewer_and_contract() {
        let alice = Address::new(Fr::from(1u64));
        let bob = Address::new(Fr::from(2u64));
        let store = NoteStore::new()
            .insert(alice, note(7, 1))
            .insert(alice, note(8, 2))
            .insert(bob, note(7, 3));

        let contract = Address::new(Fr::from(7u64));
        assert_eq!(store.notes_of(&alice, &contract), vec![note(7, 1)]);
        assert_eq!(store.notes_of(&bob, &contract), vec![note(7, 3)]);
        assert!(store.notes_of(&Address::ZERO, &contract).is_empty());
    }

    #[test]
    fn spent_notes_stay_spent() {
        let alice = Address::new(Fr::from(1u64));
        let spent = note(7, 1);
        let store = NoteStore::new()
            .insert(alice, spent.clone())
            .nullify([&spent.nullifier()]);
        assert!(store.is_empty());

        // A late decryption of the same note does not bring it back.
        let store = store.insert(alice, spent);
        assert!(store.is_empty());
    }
}
