//! YIN fundamental-frequency estimation.
//!
//! Per-frame pitch detection after de Cheveigne & Kawahara: squared
//! difference function, cumulative mean normalization, absolute-threshold
//! dip search with parabolic refinement. Frames with no dip below the
//! threshold are classified unvoiced and excluded from the pitch track's
//! statistics.

use crate::config::FeatureConfig;
use crate::dsp;

/// Estimates f0 per frame. `None` marks an unvoiced frame.
pub(crate) fn track(samples: &[f64], sample_rate: u32, cfg: &FeatureConfig) -> Vec<Option<f64>> {
    dsp::frames(samples, cfg.frame_length, cfg.hop_length)
        .map(|frame| estimate(frame, sample_rate, cfg))
        .collect()
}

/// Single-frame YIN estimate.
pub(crate) fn estimate(frame: &[f64], sample_rate: u32, cfg: &FeatureConfig) -> Option<f64> {
    if sample_rate == 0 || cfg.fmin <= 0.0 || cfg.fmax <= cfg.fmin {
        return None;
    }

    // Integration window: half the frame, so lags up to w fit in the frame.
    let w = frame.len() / 2;
    let sr = sample_rate as f64;
    let tau_min = ((sr / cfg.fmax).floor() as usize).max(2);
    let tau_max = ((sr / cfg.fmin).ceil() as usize).min(w);
    if tau_min >= tau_max {
        return None;
    }

    // Squared difference function d(tau).
    let mut diff = vec![0.0f64; tau_max + 1];
    for tau in 1..=tau_max {
        let mut sum = 0.0;
        for j in 0..w {
            let d = frame[j] - frame[j + tau];
            sum += d * d;
        }
        diff[tau] = sum;
    }

    // Cumulative mean normalized difference d'(tau).
    let mut cmndf = vec![1.0f64; tau_max + 1];
    let mut running = 0.0;
    for tau in 1..=tau_max {
        running += diff[tau];
        // Silence: d is identically zero, leave d' at 1 (unvoiced).
        cmndf[tau] = if running > 0.0 {
            diff[tau] * tau as f64 / running
        } else {
            1.0
        };
    }

    // First dip under the threshold, descended to its local minimum.
    let mut tau = tau_min;
    loop {
        if tau >= tau_max {
            return None;
        }
        if cmndf[tau] < cfg.yin_threshold {
            while tau + 1 <= tau_max && cmndf[tau + 1] < cmndf[tau] {
                tau += 1;
            }
            break;
        }
        tau += 1;
    }

    let refined = parabolic_refine(&cmndf, tau);
    let f0 = sr / refined;
    if f0 < cfg.fmin || f0 > cfg.fmax {
        return None;
    }
    Some(f0)
}

/// Parabolic interpolation of the dip position over three lags.
fn parabolic_refine(cmndf: &[f64], tau: usize) -> f64 {
    if tau == 0 || tau + 1 >= cmndf.len() {
        return tau as f64;
    }
    let (s0, s1, s2) = (cmndf[tau - 1], cmndf[tau], cmndf[tau + 1]);
    let denom = s0 - 2.0 * s1 + s2;
    if denom.abs() < 1e-12 {
        return tau as f64;
    }
    let offset = 0.5 * (s0 - s2) / denom;
    tau as f64 + offset.clamp(-1.0, 1.0)
}
