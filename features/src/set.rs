use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The measurements actually computed for one recording, keyed by feature
/// name.
///
/// Keys are whatever the extractor was able to compute; nothing guarantees
/// they match any classifier's schema. Built once per recording and never
/// mutated afterward. Iteration order is the sorted key order, which keeps
/// serialized output stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFeatureSet(BTreeMap<String, f64>);

impl RawFeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Names present in this set, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, f64)> for RawFeatureSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut set = RawFeatureSet::new();
        set.insert("Pitch_Mean", 150.0);
        assert_eq!(set.get("Pitch_Mean"), Some(150.0));
        assert_eq!(set.get("Jitter_Local"), None);
        assert!(set.contains("Pitch_Mean"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn iteration_is_sorted() {
        let mut set = RawFeatureSet::new();
        set.insert("ZCR_Mean", 0.1);
        set.insert("Energy_Mean", 0.2);
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["Energy_Mean", "ZCR_Mean"]);
    }
}
