//! Feature schema resolution, alignment and the trained classifier artifact.
//!
//! # Architecture
//!
//! Three pieces connect an extracted [`RawFeatureSet`](candor_features::RawFeatureSet)
//! to a trained model:
//!
//! 1. [`Classifier::expected_features`]: the artifact reports the ordered
//!    feature names it was trained on (its [`FeatureSchema`]).
//! 2. [`align`]: reconciles whatever the extractor produced against that
//!    schema, substituting [`DEFAULT_FILL`] for anything missing.
//! 3. [`Classifier::predict`] / [`Classifier::predict_proba`]: run the
//!    aligned row through the model.
//!
//! Feature sets computed at training time and at inference time drift:
//! extractors gain and lose measurements, columns get renamed, training
//! pipelines are rebuilt. The alignment step absorbs that drift
//! deterministically, without retraining and without failing: a missing
//! feature is normal behavior here, not an error.
//!
//! [`PipelineModel`] is the concrete artifact: an ordered list of stages
//! (standard scaler, random forest) deserialized from JSON, mirroring the
//! preprocessing-plus-model pipelines the training side exports.

mod align;
mod model;
mod schema;

pub use align::{align, align_with_aliases, AlignedFeatures, FeatureAliases, DEFAULT_FILL};
pub use model::{
    Classifier, DecisionTree, InferenceError, ModelError, PipelineModel, RandomForest, Stage,
    StandardScaler, TreeNode,
};
pub use schema::{FeatureSchema, SchemaError};
