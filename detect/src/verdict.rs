use std::fmt;

use serde::Serialize;

use crate::error::DetectError;

/// The trained label that means "deceptive". Any other label reads as
/// truthful.
pub const DECEPTIVE_CLASS: i64 = 1;

/// Binary screening outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerdictLabel {
    Truth,
    Lie,
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truth => write!(f, "Truth"),
            Self::Lie => write!(f, "Lie"),
        }
    }
}

/// A classified recording: the label plus the probability of each class.
///
/// `truth_probability + lie_probability` sums to 1 within floating-point
/// tolerance. Serializes to the wire shape the serving endpoints return.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    #[serde(rename = "result")]
    pub label: VerdictLabel,
    pub truth_probability: f64,
    pub lie_probability: f64,
}

/// Maps a raw prediction onto a [`Verdict`], pairing each probability with
/// its class via the artifact's own class ordering.
pub(crate) fn from_prediction(
    predicted: i64,
    classes: &[i64],
    proba: &[f64],
) -> Result<Verdict, DetectError> {
    if classes.len() != 2 || proba.len() != 2 {
        return Err(DetectError::Inference(format!(
            "expected a binary classifier, got {} classes and {} probabilities",
            classes.len(),
            proba.len()
        )));
    }
    let lie_idx = classes
        .iter()
        .position(|&c| c == DECEPTIVE_CLASS)
        .ok_or_else(|| {
            DetectError::Inference(format!(
                "classifier declares no deceptive class ({DECEPTIVE_CLASS}): {classes:?}"
            ))
        })?;
    let truth_idx = 1 - lie_idx;

    let label = if predicted == DECEPTIVE_CLASS {
        VerdictLabel::Lie
    } else {
        VerdictLabel::Truth
    };

    Ok(Verdict {
        label,
        truth_probability: proba[truth_idx],
        lie_probability: proba[lie_idx],
    })
}
