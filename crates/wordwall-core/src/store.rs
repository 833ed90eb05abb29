//! Entry store
//!
//! Holds every entry known to the display, ordered by creation time.
//!
//! ## Ordering
//!
//! Entries are sorted ascending by `created_at`, with missing timestamps
//! treated as epoch 0. The sort is stable, so entries with equal timestamps
//! keep their arrival order. Only `append` reorders.
//!
//! ## Identity
//!
//! Ids are unique within a store: a snapshot keeps the first occurrence of an
//! id and `append` ignores ids it has already seen. Nothing is ever removed.

use std::collections::HashSet;

use tracing::debug;

use crate::models::{Entry, EntryId};

/// Ordered, de-duplicated collection of entries
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Vec<Entry>,
    ids: HashSet<EntryId>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize the store from a snapshot, replacing any previous contents
    pub fn merge(&mut self, snapshot: impl IntoIterator<Item = Entry>) {
        self.entries.clear();
        self.ids.clear();

        for entry in snapshot {
            if self.ids.insert(entry.id.clone()) {
                self.entries.push(entry);
            } else {
                debug!("Dropping duplicate snapshot entry {}", entry.id);
            }
        }

        self.sort();
    }

    /// Insert a new entry and restore ordering
    ///
    /// Returns false (and leaves the store untouched) if the id is already known.
    pub fn append(&mut self, entry: Entry) -> bool {
        if !self.ids.insert(entry.id.clone()) {
            debug!("Ignoring duplicate entry {}", entry.id);
            return false;
        }

        self.entries.push(entry);
        self.sort();
        true
    }

    /// Current ordered entries
    pub fn get(&self) -> &[Entry] {
        &self.entries
    }

    pub fn find(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(Entry::sort_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(id: &str, secs: Option<i64>) -> Entry {
        let e = Entry::new(id, format!("text {}", id));
        match secs {
            Some(s) => e.with_created_at(Utc.timestamp_opt(s, 0).unwrap()),
            None => e,
        }
    }

    fn ids(store: &EntryStore) -> Vec<&str> {
        store.get().iter().map(|e| e.id.as_str()).collect()
    }

    fn assert_sorted(store: &EntryStore) {
        let keys: Vec<i64> = store.get().iter().map(Entry::sort_key).collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]), "unsorted: {:?}", keys);
    }

    #[test]
    fn test_merge_sorts_snapshot() {
        let mut store = EntryStore::new();
        store.merge(vec![
            entry("c", Some(300)),
            entry("a", Some(100)),
            entry("b", Some(200)),
        ]);

        assert_eq!(ids(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_timestamps_sort_first_and_stay_stable() {
        let mut store = EntryStore::new();
        store.merge(vec![
            entry("x", Some(50)),
            entry("n1", None),
            entry("n2", None),
        ]);

        assert_eq!(ids(&store), vec!["n1", "n2", "x"]);
    }

    #[test]
    fn test_append_keeps_order_at_every_step() {
        let mut store = EntryStore::new();
        store.merge(vec![entry("a", Some(10)), entry("b", Some(30))]);

        for (id, secs) in [("c", Some(20)), ("d", None), ("e", Some(40)), ("f", Some(30))] {
            assert!(store.append(entry(id, secs)));
            assert_sorted(&store);
        }

        assert_eq!(ids(&store), vec!["d", "a", "c", "b", "f", "e"]);
    }

    #[test]
    fn test_append_ignores_known_id() {
        let mut store = EntryStore::new();
        store.merge(vec![entry("a", Some(10))]);

        assert!(!store.append(entry("a", Some(5))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get()[0].sort_key(), 10_000);
    }

    #[test]
    fn test_merge_keeps_first_duplicate() {
        let mut store = EntryStore::new();
        let mut first = entry("a", Some(1));
        first.content = "first".to_string();
        let mut second = entry("a", Some(2));
        second.content = "second".to_string();

        store.merge(vec![first, second]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get()[0].content, "first");
    }

    #[test]
    fn test_find_and_contains() {
        let mut store = EntryStore::new();
        assert!(store.is_empty());
        store.append(entry("a", None));

        let id = EntryId::new("a");
        assert!(store.contains(&id));
        assert_eq!(store.find(&id).map(|e| e.content.as_str()), Some("text a"));
        assert!(store.find(&EntryId::new("zz")).is_none());
    }
}
