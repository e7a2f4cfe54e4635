//! The trained classifier artifact.
//!
//! [`PipelineModel`] mirrors the preprocessing-plus-model pipelines the
//! training side exports: an ordered list of stages, each optionally
//! declaring the feature names it was fitted on. On disk it is JSON:
//!
//! ```json
//! {
//!   "stages": [
//!     {
//!       "kind": "scaler",
//!       "feature_names_in": ["Pitch_Median", "Pitch_Mean", "Jitter_Local"],
//!       "mean": [118.2, 121.9, 0.012],
//!       "scale": [31.0, 29.4, 0.004]
//!     },
//!     {
//!       "kind": "forest",
//!       "classes": [0, 1],
//!       "trees": [
//!         {
//!           "nodes": [
//!             {"split": {"feature": 1, "threshold": 0.5, "left": 1, "right": 2}},
//!             {"leaf": {"class_counts": [40.0, 2.0]}},
//!             {"leaf": {"class_counts": [3.0, 55.0]}}
//!           ]
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::align::AlignedFeatures;
use crate::schema::{FeatureSchema, SchemaError};

/// Errors raised while loading an artifact from disk.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model artifact: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the classifier capabilities.
///
/// A structurally malformed feature vector fails identically on retry;
/// these are never retried.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("feature vector shape mismatch: expected {expected} columns, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("classifier artifact has no predictor stage")]
    NoPredictor,

    #[error("malformed model: {0}")]
    Model(String),
}

/// The capability set this pipeline consumes from a trained classifier:
/// schema introspection, label prediction and probability prediction.
///
/// The core is polymorphic over any model family offering these three
/// capabilities; nothing outside the artifact implementation depends on the
/// learning algorithm.
///
/// # Thread Safety
///
/// Implementations are shared read-only across concurrent requests and must
/// not mutate per call.
pub trait Classifier: Send + Sync {
    /// The ordered feature names this classifier was trained on.
    fn expected_features(&self) -> Result<FeatureSchema, SchemaError>;

    /// Trained class labels, in the order `predict_proba` reports them.
    fn classes(&self) -> Vec<i64>;

    /// Predicts the class label for one aligned row.
    fn predict(&self, row: &AlignedFeatures) -> Result<i64, InferenceError>;

    /// Predicts the per-class probability distribution for one aligned row,
    /// ordered like [`Classifier::classes`].
    fn predict_proba(&self, row: &AlignedFeatures) -> Result<Vec<f64>, InferenceError>;
}

/// One stage of a trained pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stage {
    Scaler(StandardScaler),
    Forest(RandomForest),
}

impl Stage {
    /// The feature names this stage declares, when it declares any.
    fn feature_names(&self) -> Option<&[String]> {
        let names = match self {
            Stage::Scaler(s) => s.feature_names_in.as_deref(),
            Stage::Forest(f) => f.feature_names_in.as_deref(),
        };
        names.filter(|n| !n.is_empty())
    }
}

/// Per-column standardization: `(x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names_in: Option<Vec<String>>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn transform(&self, row: &mut [f64]) -> Result<(), InferenceError> {
        if self.mean.len() != self.scale.len() {
            return Err(InferenceError::Model(format!(
                "scaler mean/scale width disagree: {} vs {}",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if row.len() != self.mean.len() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.mean.len(),
                got: row.len(),
            });
        }
        for (i, x) in row.iter_mut().enumerate() {
            // Constant columns are exported with scale 0; pass the centered
            // value through unscaled.
            let s = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            *x = (*x - self.mean[i]) / s;
        }
        Ok(())
    }
}

/// An averaged ensemble of decision trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names_in: Option<Vec<String>>,
    /// Class labels in probability-column order.
    pub classes: Vec<i64>,
    pub trees: Vec<DecisionTree>,
}

/// A decision tree as a flat node array; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Branch left when `row[feature] <= threshold`, right otherwise.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Training-sample counts per class at this leaf.
    Leaf { class_counts: Vec<f64> },
}

impl DecisionTree {
    /// Walks the tree for one row and returns the leaf's normalized class
    /// distribution.
    fn class_distribution(
        &self,
        row: &[f64],
        n_classes: usize,
    ) -> Result<Vec<f64>, InferenceError> {
        let mut idx = 0usize;
        // A well-formed tree reaches a leaf in at most `nodes` steps; more
        // means a cycle.
        for _ in 0..=self.nodes.len() {
            let node = self
                .nodes
                .get(idx)
                .ok_or_else(|| InferenceError::Model(format!("dangling node index {idx}")))?;
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = *row.get(*feature).ok_or_else(|| {
                        InferenceError::Model(format!(
                            "split references feature {feature} but row has {} columns",
                            row.len()
                        ))
                    })?;
                    idx = if value <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { class_counts } => {
                    if class_counts.len() != n_classes {
                        return Err(InferenceError::Model(format!(
                            "leaf has {} class counts, expected {n_classes}",
                            class_counts.len()
                        )));
                    }
                    let total: f64 = class_counts.iter().sum();
                    if total <= 0.0 {
                        return Err(InferenceError::Model("leaf with no samples".into()));
                    }
                    return Ok(class_counts.iter().map(|c| c / total).collect());
                }
            }
        }
        Err(InferenceError::Model("cycle in decision tree".into()))
    }
}

impl RandomForest {
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if self.classes.is_empty() {
            return Err(InferenceError::Model("forest declares no classes".into()));
        }
        if self.trees.is_empty() {
            return Err(InferenceError::Model("forest has no trees".into()));
        }
        if let Some(names) = &self.feature_names_in {
            if !names.is_empty() && row.len() != names.len() {
                return Err(InferenceError::ShapeMismatch {
                    expected: names.len(),
                    got: row.len(),
                });
            }
        }

        let mut acc = vec![0.0f64; self.classes.len()];
        for tree in &self.trees {
            let dist = tree.class_distribution(row, self.classes.len())?;
            for (a, d) in acc.iter_mut().zip(dist.iter()) {
                *a += d;
            }
        }
        let n = self.trees.len() as f64;
        for a in &mut acc {
            *a /= n;
        }
        Ok(acc)
    }
}

/// A trained pipeline of preprocessing and model stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineModel {
    stages: Vec<Stage>,
}

impl PipelineModel {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Loads a JSON artifact from disk.
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let data = std::fs::read(path)?;
        Self::from_slice(&data)
    }

    /// Parses a JSON artifact from bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, ModelError> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Runs preprocessing stages in order and the first predictor stage's
    /// probability capability.
    fn run_proba(&self, row: &AlignedFeatures) -> Result<Vec<f64>, InferenceError> {
        let mut x = row.values().to_vec();
        for stage in &self.stages {
            match stage {
                Stage::Scaler(scaler) => scaler.transform(&mut x)?,
                Stage::Forest(forest) => return forest.predict_proba(&x),
            }
        }
        Err(InferenceError::NoPredictor)
    }
}

impl Classifier for PipelineModel {
    /// Locates the first stage that declares the feature names it was
    /// fitted on and returns that declaration, order preserved.
    fn expected_features(&self) -> Result<FeatureSchema, SchemaError> {
        self.stages
            .iter()
            .find_map(Stage::feature_names)
            .map(|names| FeatureSchema::new(names.to_vec()))
            .ok_or(SchemaError::Unavailable)?
    }

    fn classes(&self) -> Vec<i64> {
        self.stages
            .iter()
            .find_map(|stage| match stage {
                Stage::Forest(f) => Some(f.classes.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn predict(&self, row: &AlignedFeatures) -> Result<i64, InferenceError> {
        let proba = self.run_proba(row)?;
        let classes = self.classes();
        // argmax, first index winning ties.
        let best = proba
            .iter()
            .enumerate()
            .reduce(|best, cur| if cur.1 > best.1 { cur } else { best })
            .map(|(i, _)| i)
            .ok_or_else(|| InferenceError::Model("empty probability vector".into()))?;
        classes
            .get(best)
            .copied()
            .ok_or_else(|| InferenceError::Model("probability/classes width disagree".into()))
    }

    fn predict_proba(&self, row: &AlignedFeatures) -> Result<Vec<f64>, InferenceError> {
        self.run_proba(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two-feature model: scaler plus a two-tree forest that votes on the
    /// first (scaled) feature.
    pub(crate) fn sample_model() -> PipelineModel {
        PipelineModel::new(vec![
            Stage::Scaler(StandardScaler {
                feature_names_in: Some(vec!["Pitch_Mean".into(), "Jitter_Local".into()]),
                mean: vec![120.0, 0.01],
                scale: vec![30.0, 0.005],
            }),
            Stage::Forest(RandomForest {
                feature_names_in: None,
                classes: vec![0, 1],
                trees: vec![
                    DecisionTree {
                        nodes: vec![
                            TreeNode::Split {
                                feature: 0,
                                threshold: 0.0,
                                left: 1,
                                right: 2,
                            },
                            TreeNode::Leaf {
                                class_counts: vec![9.0, 1.0],
                            },
                            TreeNode::Leaf {
                                class_counts: vec![2.0, 8.0],
                            },
                        ],
                    },
                    DecisionTree {
                        nodes: vec![
                            TreeNode::Split {
                                feature: 0,
                                threshold: 0.5,
                                left: 1,
                                right: 2,
                            },
                            TreeNode::Leaf {
                                class_counts: vec![7.0, 3.0],
                            },
                            TreeNode::Leaf {
                                class_counts: vec![1.0, 9.0],
                            },
                        ],
                    },
                ],
            }),
        ])
    }

    #[test]
    fn schema_comes_from_first_declaring_stage() {
        let model = sample_model();
        let schema = model.expected_features().expect("schema");
        assert_eq!(schema.names(), &["Pitch_Mean".to_string(), "Jitter_Local".to_string()]);
    }

    #[test]
    fn schema_resolution_is_deterministic() {
        let model = sample_model();
        let a = model.expected_features().expect("schema");
        let b = model.expected_features().expect("schema");
        assert_eq!(a, b);
    }

    #[test]
    fn schema_unavailable_when_no_stage_declares() {
        let model = PipelineModel::new(vec![Stage::Forest(RandomForest {
            feature_names_in: None,
            classes: vec![0, 1],
            trees: vec![DecisionTree {
                nodes: vec![TreeNode::Leaf {
                    class_counts: vec![1.0, 1.0],
                }],
            }],
        })]);
        assert!(matches!(
            model.expected_features(),
            Err(SchemaError::Unavailable)
        ));
    }

    #[test]
    fn empty_name_list_does_not_count_as_declared() {
        let model = PipelineModel::new(vec![Stage::Scaler(StandardScaler {
            feature_names_in: Some(vec![]),
            mean: vec![],
            scale: vec![],
        })]);
        assert!(matches!(
            model.expected_features(),
            Err(SchemaError::Unavailable)
        ));
    }

    #[test]
    fn proba_sums_to_one() {
        let model = sample_model();
        // Pitch 180 scales to 2.0: both trees take the right branch.
        let row = AlignedFeatures::new(vec![180.0, 0.01]);
        let proba = model.predict_proba(&row).expect("proba");
        assert_eq!(proba.len(), 2);
        let total: f64 = proba.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "sum {total}");
        // (0.2 + 0.1) / 2 and (0.8 + 0.9) / 2.
        assert!((proba[0] - 0.15).abs() < 1e-9);
        assert!((proba[1] - 0.85).abs() < 1e-9);
    }

    #[test]
    fn predict_is_argmax_of_proba() {
        let model = sample_model();
        let high = AlignedFeatures::new(vec![180.0, 0.01]);
        assert_eq!(model.predict(&high).expect("predict"), 1);
        let low = AlignedFeatures::new(vec![60.0, 0.01]);
        assert_eq!(model.predict(&low).expect("predict"), 0);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let model = sample_model();
        let row = AlignedFeatures::new(vec![180.0]);
        assert!(matches!(
            model.predict_proba(&row),
            Err(InferenceError::ShapeMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn no_predictor_stage() {
        let model = PipelineModel::new(vec![Stage::Scaler(StandardScaler {
            feature_names_in: Some(vec!["A".into()]),
            mean: vec![0.0],
            scale: vec![1.0],
        })]);
        let row = AlignedFeatures::new(vec![1.0]);
        assert!(matches!(
            model.predict_proba(&row),
            Err(InferenceError::NoPredictor)
        ));
    }

    #[test]
    fn dangling_child_index_is_malformed() {
        let model = PipelineModel::new(vec![Stage::Forest(RandomForest {
            feature_names_in: Some(vec!["A".into()]),
            classes: vec![0, 1],
            trees: vec![DecisionTree {
                nodes: vec![TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 7,
                    right: 8,
                }],
            }],
        })]);
        let row = AlignedFeatures::new(vec![1.0]);
        assert!(matches!(
            model.predict_proba(&row),
            Err(InferenceError::Model(_))
        ));
    }

    #[test]
    fn self_referencing_tree_is_malformed() {
        let model = PipelineModel::new(vec![Stage::Forest(RandomForest {
            feature_names_in: Some(vec!["A".into()]),
            classes: vec![0, 1],
            trees: vec![DecisionTree {
                nodes: vec![TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 0,
                }],
            }],
        })]);
        let row = AlignedFeatures::new(vec![-1.0]);
        assert!(matches!(
            model.predict_proba(&row),
            Err(InferenceError::Model(msg)) if msg.contains("cycle")
        ));
    }

    #[test]
    fn zero_scale_passes_centered_value() {
        let scaler = StandardScaler {
            feature_names_in: None,
            mean: vec![5.0],
            scale: vec![0.0],
        };
        let mut row = vec![7.0];
        scaler.transform(&mut row).expect("transform");
        assert_eq!(row, vec![2.0]);
    }

    #[test]
    fn json_roundtrip() {
        let model = sample_model();
        let json = serde_json::to_vec(&model).expect("serialize");
        let back = PipelineModel::from_slice(&json).expect("parse");
        let row = AlignedFeatures::new(vec![180.0, 0.01]);
        assert_eq!(
            model.predict_proba(&row).expect("proba"),
            back.predict_proba(&row).expect("proba")
        );
    }

    #[test]
    fn from_path_reads_artifact() {
        use std::io::Write;
        let model = sample_model();
        let json = serde_json::to_vec_pretty(&model).expect("serialize");
        let mut tmp = tempfile::NamedTempFile::new().expect("tempfile");
        tmp.write_all(&json).expect("write");
        let loaded = PipelineModel::from_path(tmp.path()).expect("load");
        assert_eq!(loaded.classes(), vec![0, 1]);
        assert_eq!(
            loaded.expected_features().expect("schema").len(),
            2
        );
    }

    #[test]
    fn from_path_missing_file() {
        let err = PipelineModel::from_path(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }

    #[test]
    fn from_slice_rejects_garbage() {
        let err = PipelineModel::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, ModelError::Json(_)));
    }
}
