use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while resolving a classifier's feature schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No stage of the artifact declares the feature names it was fitted
    /// on. Fatal: no inference is possible without a schema.
    #[error("classifier artifact declares no feature names")]
    Unavailable,

    #[error("duplicate feature name in schema: {0}")]
    Duplicate(String),
}

/// The ordered, unique feature names a trained classifier expects.
///
/// Order is significant: the classifier only ever receives feature vectors
/// in exactly this column order. Resolved once per artifact and read-only
/// afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema(Vec<String>);

impl FeatureSchema {
    /// Validates uniqueness and wraps the ordered name list.
    pub fn new(names: Vec<String>) -> Result<Self, SchemaError> {
        let mut seen = std::collections::HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::Duplicate(name.clone()));
            }
        }
        Ok(Self(names))
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Column index of `name`, if the schema contains it.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> FeatureSchema {
        FeatureSchema::new(names.iter().map(|s| s.to_string()).collect()).expect("valid")
    }

    #[test]
    fn preserves_order() {
        let s = schema(&["Pitch_Median", "Pitch_Mean", "Jitter_Local"]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.names()[0], "Pitch_Median");
        assert_eq!(s.position("Jitter_Local"), Some(2));
        assert_eq!(s.position("HNR"), None);
    }

    #[test]
    fn rejects_duplicates() {
        let err = FeatureSchema::new(vec!["HNR".into(), "NHR".into(), "HNR".into()]).unwrap_err();
        assert!(matches!(err, SchemaError::Duplicate(name) if name == "HNR"));
    }

    #[test]
    fn empty_schema_is_allowed_by_constructor() {
        let s = FeatureSchema::new(vec![]).expect("valid");
        assert!(s.is_empty());
    }
}
