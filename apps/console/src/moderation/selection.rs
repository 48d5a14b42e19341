#![allow(dead_code)]

//! Client-side working set of draft-job ids chosen for a bulk action.

use std::collections::HashSet;

use crate::models::job::DraftJob;

/// Selected draft-job identifiers. Membership is only meaningful relative to
/// the current pending collection; [`SelectionSet::retain_valid`] truncates
/// the set whenever that collection changes. Never persisted.
#[derive(Debug, Default, Clone)]
pub struct SelectionSet {
    ids: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the id if absent, removes it if present.
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Replaces the selection with every id in the collection as it stands
    /// right now. Not a sticky predicate: jobs fetched later stay unselected
    /// until select-all is invoked again.
    pub fn select_all(&mut self, pending: &[DraftJob]) {
        self.ids = pending.iter().map(|job| job.id.clone()).collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.remove(id);
    }

    /// Drops members that no longer exist in the pending collection.
    pub fn retain_valid(&mut self, pending: &[DraftJob]) {
        let live: HashSet<&str> = pending.iter().map(|job| job.id.as_str()).collect();
        self.ids.retain(|id| live.contains(id.as_str()));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Sorted snapshot of the selected ids, for deterministic batch payloads.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Computed against the collection on every call. An "all selected"
    /// checkbox is a view of current state, not state of its own; caching it
    /// is how it drifts out of sync.
    pub fn is_all_selected(&self, pending: &[DraftJob]) -> bool {
        self.ids.len() == pending.len() && pending.iter().all(|job| self.ids.contains(&job.id))
    }
}
