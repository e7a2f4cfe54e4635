use std::path::Path;

use candor_audio::Waveform;
use candor_classifier::{align, AlignedFeatures, Classifier, FeatureSchema};
use candor_features::{extract, FeatureConfig, RawFeatureSet};
use serde::Serialize;

use crate::error::DetectError;
use crate::verdict::{self, Verdict};

/// The pipeline facade: one classifier artifact, its resolved schema, and
/// the extraction config, shared read-only across requests.
///
/// The schema is resolved once in the constructor, the process's defined
/// initialization step. A schema-less artifact therefore fails here, before
/// any request runs.
pub struct Detector<C> {
    classifier: C,
    schema: FeatureSchema,
    config: FeatureConfig,
}

/// Everything the pipeline produced for one recording.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub features: RawFeatureSet,
    #[serde(flatten)]
    pub verdict: Verdict,
}

impl<C: Classifier> Detector<C> {
    /// Builds a detector with the default extraction config.
    pub fn new(classifier: C) -> Result<Self, DetectError> {
        Self::with_config(classifier, FeatureConfig::default())
    }

    /// Builds a detector with a custom extraction config.
    pub fn with_config(classifier: C, config: FeatureConfig) -> Result<Self, DetectError> {
        let schema = classifier.expected_features()?;
        tracing::debug!(columns = schema.len(), "resolved classifier feature schema");
        Ok(Self {
            classifier,
            schema,
            config,
        })
    }

    /// The schema the classifier was trained on.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Decodes an audio file, extracts the catalogue and aligns it to the
    /// classifier's schema.
    pub fn extract_and_align(&self, path: &Path) -> Result<AlignedFeatures, DetectError> {
        let wave = candor_audio::decode_file(path)?;
        Ok(self.align_waveform(&wave))
    }

    /// [`Detector::extract_and_align`] over in-memory audio bytes.
    pub fn extract_and_align_bytes(&self, data: Vec<u8>) -> Result<AlignedFeatures, DetectError> {
        let wave = candor_audio::decode_bytes(data)?;
        Ok(self.align_waveform(&wave))
    }

    /// Classifies an aligned row.
    ///
    /// Classifier-raised failures are caught here, at the adapter boundary,
    /// and surfaced as [`DetectError::Inference`] with the underlying
    /// message attached. No retry: a malformed row fails identically again.
    pub fn infer(&self, features: &AlignedFeatures) -> Result<Verdict, DetectError> {
        let predicted = self.classifier.predict(features)?;
        let proba = self.classifier.predict_proba(features)?;
        let classes = self.classifier.classes();
        verdict::from_prediction(predicted, &classes, &proba)
    }

    /// Full pipeline for one file: raw features plus the verdict.
    pub fn analyze(&self, path: &Path) -> Result<Analysis, DetectError> {
        let wave = candor_audio::decode_file(path)?;
        let features = extract(&wave, &self.config);
        let aligned = align(&features, &self.schema);
        let verdict = self.infer(&aligned)?;
        Ok(Analysis { features, verdict })
    }

    fn align_waveform(&self, wave: &Waveform) -> AlignedFeatures {
        let raw = extract(wave, &self.config);
        align(&raw, &self.schema)
    }
}
