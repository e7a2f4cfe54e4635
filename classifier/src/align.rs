//! Schema alignment with default fill.

use std::collections::BTreeMap;

use candor_features::RawFeatureSet;
use serde::Serialize;

use crate::schema::FeatureSchema;

/// Value substituted for schema columns the extractor did not produce.
///
/// Deliberate policy, not a fallback: a classifier trained on a richer
/// schema than the extractor computes still receives a structurally valid
/// row, at the cost of informational accuracy in the defaulted columns.
pub const DEFAULT_FILL: f64 = 0.0;

/// A feature row in a schema's exact column order.
///
/// Invariant: built against a [`FeatureSchema`] of the same length, with
/// position `i` holding the value for schema column `i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AlignedFeatures(Vec<f64>);

impl AlignedFeatures {
    /// Wraps an already-ordered row. Prefer [`align`] for building rows
    /// from extractor output.
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Reconciles extractor output against a classifier's schema.
///
/// For each schema name, in order: the raw value if present, otherwise
/// [`DEFAULT_FILL`]. Never fails; the output length always equals the
/// schema length regardless of what the raw set holds.
pub fn align(raw: &RawFeatureSet, schema: &FeatureSchema) -> AlignedFeatures {
    AlignedFeatures(
        schema
            .iter()
            .map(|name| raw.get(name).unwrap_or(DEFAULT_FILL))
            .collect(),
    )
}

/// Legacy-name to canonical-name renames applied before alignment.
///
/// Covers datasets exported with older extractor column names. The default
/// table carries the renames the training data needed.
#[derive(Debug, Clone)]
pub struct FeatureAliases(BTreeMap<String, String>);

impl FeatureAliases {
    /// An empty alias table.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, legacy: impl Into<String>, canonical: impl Into<String>) {
        self.0.insert(legacy.into(), canonical.into());
    }

    /// Returns a copy of `raw` with legacy keys renamed to their canonical
    /// form. An existing canonical key always wins over a rename.
    pub fn apply(&self, raw: &RawFeatureSet) -> RawFeatureSet {
        let mut renamed = RawFeatureSet::new();
        for (name, value) in raw.iter() {
            match self.0.get(name) {
                Some(canonical) if !raw.contains(canonical) => {
                    renamed.insert(canonical.clone(), value)
                }
                Some(_) => {}
                None => renamed.insert(name, value),
            }
        }
        renamed
    }
}

impl Default for FeatureAliases {
    fn default() -> Self {
        let mut aliases = Self::empty();
        aliases.insert("Amplitude(Shimmer)", "Shimmer_dB");
        aliases.insert("Frequency(Jitter)", "Jitter_RAP");
        aliases.insert("Harmonicity", "HNR");
        aliases
    }
}

/// [`align`] with a rename pass first: legacy dataset columns are mapped to
/// their canonical names before the schema lookup.
pub fn align_with_aliases(
    raw: &RawFeatureSet,
    schema: &FeatureSchema,
    aliases: &FeatureAliases,
) -> AlignedFeatures {
    align(&aliases.apply(raw), schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> FeatureSchema {
        FeatureSchema::new(names.iter().map(|s| s.to_string()).collect()).expect("valid")
    }

    fn raw(entries: &[(&str, f64)]) -> RawFeatureSet {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn align_fills_missing_with_default() {
        let s = schema(&["Pitch_Mean", "Jitter_Local"]);
        let r = raw(&[("Pitch_Mean", 150.0)]);
        let aligned = align(&r, &s);
        assert_eq!(aligned.values(), &[150.0, 0.0]);
    }

    #[test]
    fn align_length_always_matches_schema() {
        let s = schema(&["A", "B", "C"]);

        // Raw smaller than schema.
        assert_eq!(align(&raw(&[("A", 1.0)]), &s).len(), 3);
        // Raw disjoint from schema.
        assert_eq!(align(&raw(&[("X", 9.0), ("Y", 8.0)]), &s).len(), 3);
        // Raw larger than schema: extras are ignored.
        let r = raw(&[("A", 1.0), ("B", 2.0), ("C", 3.0), ("D", 4.0)]);
        let aligned = align(&r, &s);
        assert_eq!(aligned.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn align_follows_schema_order_not_raw_order() {
        let s = schema(&["Pitch_Median", "Pitch_Mean", "Pitch_Max"]);
        let r = raw(&[("Pitch_Mean", 1.0), ("Pitch_Median", 2.0), ("Pitch_Max", 3.0)]);
        assert_eq!(align(&r, &s).values(), &[2.0, 1.0, 3.0]);
    }

    #[test]
    fn align_is_idempotent() {
        let s = schema(&["Pitch_Mean", "Jitter_Local", "HNR"]);
        let r = raw(&[("Pitch_Mean", 150.0), ("HNR", 12.5)]);
        let once = align(&r, &s);

        // Re-key the aligned output by schema name and align again.
        let refed: RawFeatureSet = s
            .iter()
            .zip(once.values().iter())
            .map(|(name, v)| (name.to_string(), *v))
            .collect();
        let twice = align(&refed, &s);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_raw_set_yields_all_defaults() {
        let s = schema(&["A", "B"]);
        let aligned = align(&RawFeatureSet::new(), &s);
        assert_eq!(aligned.values(), &[DEFAULT_FILL, DEFAULT_FILL]);
    }

    #[test]
    fn aliases_rename_legacy_columns() {
        let s = schema(&["Shimmer_dB", "Jitter_RAP", "HNR"]);
        let r = raw(&[
            ("Amplitude(Shimmer)", 0.3),
            ("Frequency(Jitter)", 0.01),
            ("Harmonicity", 14.0),
        ]);
        let aligned = align_with_aliases(&r, &s, &FeatureAliases::default());
        assert_eq!(aligned.values(), &[0.3, 0.01, 14.0]);
    }

    #[test]
    fn canonical_name_wins_over_alias() {
        let s = schema(&["HNR"]);
        let r = raw(&[("Harmonicity", 1.0), ("HNR", 2.0)]);
        let aligned = align_with_aliases(&r, &s, &FeatureAliases::default());
        assert_eq!(aligned.values(), &[2.0]);
    }
}
