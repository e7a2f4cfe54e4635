//! The fixed extraction catalogue.

use candor_audio::Waveform;

use crate::config::FeatureConfig;
use crate::dsp;
use crate::pitch;
use crate::set::RawFeatureSet;
use crate::stats;

/// Canonical feature names produced by [`extract`].
pub mod names {
    pub const PITCH_MEAN: &str = "Pitch_Mean";
    pub const PITCH_MEDIAN: &str = "Pitch_Median";
    pub const PITCH_MIN: &str = "Pitch_Min";
    pub const PITCH_MAX: &str = "Pitch_Max";
    pub const PITCH_STD: &str = "Pitch_Std";
    pub const ENERGY_MEAN: &str = "Energy_Mean";
    pub const ENERGY_STD: &str = "Energy_Std";
    pub const SPECTRAL_CENTROID_MEAN: &str = "SpectralCentroid_Mean";
    pub const SPECTRAL_BANDWIDTH_MEAN: &str = "SpectralBandwidth_Mean";
    pub const ZCR_MEAN: &str = "ZCR_Mean";
}

/// Computes the full acoustic catalogue for one recording.
///
/// Pure and deterministic: the same waveform and config always produce the
/// same set. Pitch statistics cover voiced frames only; when no frame is
/// voiced every pitch statistic is `0`.
pub fn extract(wave: &Waveform, cfg: &FeatureConfig) -> RawFeatureSet {
    let samples: Vec<f64> = wave.samples().iter().map(|&s| s as f64).collect();
    let sample_rate = wave.sample_rate();

    let mut set = RawFeatureSet::new();

    // Pitch track over voiced frames.
    let voiced = voiced_values(&pitch::track(&samples, sample_rate, cfg));
    set.insert(names::PITCH_MEAN, stats::mean(&voiced).unwrap_or(0.0));
    set.insert(names::PITCH_MEDIAN, stats::median(&voiced).unwrap_or(0.0));
    set.insert(names::PITCH_MIN, stats::min(&voiced).unwrap_or(0.0));
    set.insert(names::PITCH_MAX, stats::max(&voiced).unwrap_or(0.0));
    set.insert(names::PITCH_STD, stats::std_dev(&voiced).unwrap_or(0.0));

    // Short-frame RMS energy.
    let rms: Vec<f64> = dsp::frames(&samples, cfg.frame_length, cfg.hop_length)
        .map(frame_rms)
        .collect();
    set.insert(names::ENERGY_MEAN, stats::mean(&rms).unwrap_or(0.0));
    set.insert(names::ENERGY_STD, stats::std_dev(&rms).unwrap_or(0.0));

    // Spectral centroid and bandwidth.
    let (centroids, bandwidths) = spectral_moments(&samples, sample_rate, cfg);
    set.insert(
        names::SPECTRAL_CENTROID_MEAN,
        stats::mean(&centroids).unwrap_or(0.0),
    );
    set.insert(
        names::SPECTRAL_BANDWIDTH_MEAN,
        stats::mean(&bandwidths).unwrap_or(0.0),
    );

    // Zero-crossing rate.
    let zcr: Vec<f64> = dsp::frames(&samples, cfg.frame_length, cfg.hop_length)
        .map(frame_zcr)
        .collect();
    set.insert(names::ZCR_MEAN, stats::mean(&zcr).unwrap_or(0.0));

    set
}

/// Drops unvoiced frames from a pitch track before statistics.
fn voiced_values(track: &[Option<f64>]) -> Vec<f64> {
    track.iter().flatten().copied().collect()
}

fn frame_rms(frame: &[f64]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|s| s * s).sum::<f64>() / frame.len() as f64).sqrt()
}

/// Fraction of sample pairs in the frame whose signs differ.
fn frame_zcr(frame: &[f64]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f64 / frame.len() as f64
}

/// Per-frame magnitude-spectrum centroid and second-order bandwidth, Hz.
///
/// An all-zero frame has no spectral mass; it contributes 0 for both
/// moments instead of a 0/0 division.
fn spectral_moments(
    samples: &[f64],
    sample_rate: u32,
    cfg: &FeatureConfig,
) -> (Vec<f64>, Vec<f64>) {
    let fft_size = dsp::next_pow2(cfg.frame_length.max(2));
    let window = dsp::hann_window(cfg.frame_length);
    let bin_hz = sample_rate as f64 / fft_size as f64;

    let mut centroids = Vec::new();
    let mut bandwidths = Vec::new();

    for frame in dsp::frames(samples, cfg.frame_length, cfg.hop_length) {
        let mags = dsp::magnitude_spectrum(frame, &window, fft_size);
        let total: f64 = mags.iter().sum();
        if total <= f64::EPSILON {
            centroids.push(0.0);
            bandwidths.push(0.0);
            continue;
        }

        let centroid = mags
            .iter()
            .enumerate()
            .map(|(k, m)| k as f64 * bin_hz * m)
            .sum::<f64>()
            / total;

        let spread = mags
            .iter()
            .enumerate()
            .map(|(k, m)| {
                let d = k as f64 * bin_hz - centroid;
                m * d * d
            })
            .sum::<f64>()
            / total;

        centroids.push(centroid);
        bandwidths.push(spread.sqrt());
    }

    (centroids, bandwidths)
}
