//! Dataset mode: score rows of precomputed feature columns from a CSV.
//!
//! Columns are renamed through the legacy alias table, coerced to numbers,
//! and aligned against the schema introspected from the artifact, never
//! against a hand-maintained feature list, so this path cannot drift from
//! the live pipeline.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, warn};

use candor_classifier::{align_with_aliases, FeatureAliases, PipelineModel, DEFAULT_FILL};
use candor_detect::{Detector, VerdictLabel};
use candor_features::RawFeatureSet;

/// Bookkeeping columns carried by exported datasets, never features.
const DROP_COLUMNS: &[&str] = &["Audio", "Start", "End", "Speaker", "Label"];

pub fn run(detector: &Detector<PipelineModel>, path: &Path, json: bool) -> Result<()> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening dataset {}", path.display()))?;
    let headers = reader
        .headers()
        .context("reading dataset header row")?
        .clone();

    let aliases = FeatureAliases::default();

    // Surface schema divergence once per column, up front.
    let canonical: HashSet<String> = {
        let mut probe = RawFeatureSet::new();
        for h in headers.iter() {
            probe.insert(h, 0.0);
        }
        aliases.apply(&probe).names().map(String::from).collect()
    };
    for name in detector.schema().iter() {
        if !canonical.contains(name) {
            warn!("dataset has no column {name:?}; filling with {DEFAULT_FILL}");
        }
    }

    let mut results = Vec::new();
    let mut truths = 0usize;
    let mut lies = 0usize;

    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading dataset row {}", row_idx + 1))?;

        let mut raw = RawFeatureSet::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if DROP_COLUMNS.contains(&header) {
                continue;
            }
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            match cell.parse::<f64>() {
                Ok(value) => raw.insert(header, value),
                Err(_) => {
                    debug!("row {}: non-numeric cell in {header:?}, treated as absent", row_idx + 1);
                }
            }
        }

        let aligned = align_with_aliases(&raw, detector.schema(), &aliases);
        let verdict = detector
            .infer(&aligned)
            .with_context(|| format!("classifying dataset row {}", row_idx + 1))?;

        match verdict.label {
            VerdictLabel::Truth => truths += 1,
            VerdictLabel::Lie => lies += 1,
        }

        if json {
            results.push(json!({
                "row": row_idx + 1,
                "result": verdict.label.to_string(),
                "truth_probability": verdict.truth_probability,
                "lie_probability": verdict.lie_probability,
            }));
        } else {
            println!(
                "row {}: {} (truth {:.3}, lie {:.3})",
                row_idx + 1,
                verdict.label,
                verdict.truth_probability,
                verdict.lie_probability
            );
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "rows": results,
                "summary": {"truth": truths, "lie": lies},
            }))?
        );
    } else {
        println!();
        println!("{} rows: {truths} truth, {lies} lie", truths + lies);
    }

    Ok(())
}
