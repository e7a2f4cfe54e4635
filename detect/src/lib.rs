//! End-to-end deception screening over audio recordings.
//!
//! # Architecture
//!
//! The pipeline runs four stages per recording:
//!
//! 1. decode: audio bytes -> [`Waveform`](candor_audio::Waveform)
//! 2. extract: waveform -> [`RawFeatureSet`](candor_features::RawFeatureSet)
//! 3. align: raw features x classifier schema -> [`AlignedFeatures`](candor_classifier::AlignedFeatures)
//! 4. infer: aligned row -> [`Verdict`]
//!
//! [`Detector`] ties the stages together around one classifier artifact.
//! Construction is the process's single initialization step: the
//! classifier's feature schema is resolved exactly once there, so an
//! artifact without an introspectable schema fails startup rather than
//! individual requests. After construction the detector is read-only and
//! safe to share across threads; each call is fully synchronous and
//! self-contained.

mod detector;
mod error;
mod verdict;

pub use detector::{Analysis, Detector};
pub use error::DetectError;
pub use verdict::{Verdict, VerdictLabel, DECEPTIVE_CLASS};
