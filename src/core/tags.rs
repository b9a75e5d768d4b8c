//! Tag sets and the three-layer merge shared by all patterns.
//!
//! Precedence, lowest to highest: built-in defaults < pattern-level tags
//! supplied at construction < call-level tags supplied per resource
//! creation. Later layers overwrite earlier ones on key collision.
//! Insertion order is preserved so synthesized templates are stable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An ordered tag key/value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet(IndexMap<String, String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Merge tag layers in increasing precedence.
pub fn merge_tags(defaults: &TagSet, pattern: &TagSet, call: &TagSet) -> TagSet {
    let mut merged = defaults.clone();
    for (k, v) in pattern.iter() {
        merged.insert(k, v);
    }
    for (k, v) in call.iter() {
        merged.insert(k, v);
    }
    merged
}
