//! In-memory party index.
//!
//! Holds every loaded party keyed by id. All reads and writes during
//! runtime go through here; the file is only touched on load and sync.

use std::collections::BTreeMap;

use super::types::{PartyId, PartyRecord};

/// All parties of one store, keyed by id.
#[derive(Debug, Default, Clone)]
pub struct PartyIndex {
    parties: BTreeMap<PartyId, PartyRecord>,
}

impl PartyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PartyId) -> Option<&PartyRecord> {
        self.parties.get(&id)
    }

    pub fn contains(&self, id: PartyId) -> bool {
        self.parties.contains_key(&id)
    }

    /// Insert or replace the party stored under `id`.
    ///
    /// The stored record's id is forced to `id`.
    pub fn put(&mut self, id: PartyId, mut party: PartyRecord) {
        party.id = id;
        self.parties.insert(id, party);
    }

    /// Remove a party. Returns the removed record, if there was one.
    pub fn delete(&mut self, id: PartyId) -> Option<PartyRecord> {
        self.parties.remove(&id)
    }

    pub fn clear(&mut self) {
        self.parties.clear();
    }

    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }

    /// Iterate over every party.
    ///
    /// Order is whatever the index keeps; callers must not depend on it.
    pub fn iter(&self) -> impl Iterator<Item = &PartyRecord> + '_ {
        self.parties.values()
    }

    /// Id of the first party whose name matches, in iteration order.
    pub fn find_by_name(&self, name: &str, case_sensitive: bool) -> Option<PartyId> {
        self.iter()
            .find(|p| {
                if case_sensitive {
                    p.name == name
                } else {
                    p.name.eq_ignore_ascii_case(name)
                }
            })
            .map(|p| p.id)
    }
}

// ============================================================================
// TESTS
// ============================================================================
