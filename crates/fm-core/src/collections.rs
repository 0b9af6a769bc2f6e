//! Concurrent collections shared by the resolver.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;

/// Keyed sink filled from worker threads and drained once they are joined.
///
/// The first value stored under a key is kept; later ones are rejected so the
/// caller can report the clash.
pub struct ConcurrentMap<K, V> {
    inner: DashMap<K, V>,
}

impl<K: Eq + Hash, V> Default for ConcurrentMap<K, V> {
    fn default() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> ConcurrentMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` unless `key` is taken, handing the value back on a clash.
    pub fn insert_first(&self, key: K, value: V) -> Result<(), V> {
        match self.inner.entry(key) {
            Entry::Occupied(_) => Err(value),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn into_sorted_vec(self) -> Vec<(K, V)>
    where
        K: Ord,
    {
        let mut entries: Vec<(K, V)> = self.inner.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
