//! Append-only key/value table.
//!
//! Keys may be added and their values superseded, but a key can never be
//! dropped. External callers cache configuration ids and matrix labels, so
//! every key ever published must stay resolvable for the life of the process.

use std::collections::BTreeMap;
use std::fmt::Display;

/// `BTreeMap` wrapper with no removal path.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendOnlyMap<K: Ord, V> {
    inner: BTreeMap<K, V>,
}

impl<K: Ord, V> Default for AppendOnlyMap<K, V> {
    fn default() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone + Display, V: Clone> AppendOnlyMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key or supersede its value. Returns the previous value, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.inner.insert(key, value)
    }

    /// Swap in a whole new table.
    ///
    /// Fails without touching the current contents if any existing key is
    /// absent from `replacement`.
    pub fn replace_all(&mut self, replacement: BTreeMap<K, V>) -> Result<(), KeyRemoval> {
        let dropped: Vec<String> = self
            .inner
            .keys()
            .filter(|k| !replacement.contains_key(*k))
            .map(|k| k.to_string())
            .collect();

        if !dropped.is_empty() {
            return Err(KeyRemoval { keys: dropped });
        }

        self.inner = replacement;
        Ok(())
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Independent copy of the current table.
    pub fn snapshot(&self) -> BTreeMap<K, V> {
        self.inner.clone()
    }
}

impl<K: Ord + Clone + Display, V: Clone> FromIterator<(K, V)> for AppendOnlyMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// Attempt to drop published keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("keys can never be removed once added; replacement drops: \"{}\"", .keys.join("\", \""))]
pub struct KeyRemoval {
    pub keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppendOnlyMap<String, u32> {
        [("a".to_string(), 1), ("b".to_string(), 2)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_insert_supersedes_value() {
        let mut map = sample();
        assert_eq!(map.insert("a".to_string(), 10), Some(1));
        assert_eq!(map.get("a"), Some(&10));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_replace_all_keeps_superset() {
        let mut map = sample();
        let mut next = map.snapshot();
        next.insert("b".to_string(), 20);
        next.insert("c".to_string(), 3);

        map.replace_all(next).unwrap();
        assert_eq!(map.get("b"), Some(&20));
        assert!(map.contains_key("c"));
    }

    #[test]
    fn test_replace_all_rejects_dropped_key() {
        let mut map = sample();
        let mut next = BTreeMap::new();
        next.insert("a".to_string(), 1);

        let err = map.replace_all(next).unwrap_err();
        assert_eq!(err.keys, vec!["b".to_string()]);
        // Unchanged on failure
        assert!(map.contains_key("b"));
        assert!(err.to_string().contains("\"b\""));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let map = sample();
        let mut snap = map.snapshot();
        snap.remove("a");
        assert!(map.contains_key("a"));
    }
}
