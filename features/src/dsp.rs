//! Frame iteration, windowing and FFT primitives.

use std::f64::consts::PI;

/// Yields frames of `frame_length` samples every `hop_length` samples.
///
/// Only full frames are yielded; a signal shorter than one frame yields a
/// single frame covering the whole signal so that short recordings still
/// produce features.
pub(crate) fn frames<'a>(
    samples: &'a [f64],
    frame_length: usize,
    hop_length: usize,
) -> Box<dyn Iterator<Item = &'a [f64]> + 'a> {
    if samples.is_empty() || frame_length == 0 || hop_length == 0 {
        return Box::new(std::iter::empty());
    }
    if samples.len() < frame_length {
        return Box::new(std::iter::once(samples));
    }
    let last_start = samples.len() - frame_length;
    Box::new(
        (0..=last_start)
            .step_by(hop_length)
            .map(move |start| &samples[start..start + frame_length]),
    )
}

/// Hann window of length `n`.
pub(crate) fn hann_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Smallest power of two >= `n`.
pub(crate) fn next_pow2(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

/// In-place iterative Cooley-Tukey FFT over (real, imag) tuples.
/// Input length must be a power of two.
pub(crate) fn fft(x: &mut [(f64, f64)]) {
    let n = x.len();
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation.
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            x.swap(i, j);
        }
    }

    // Butterflies.
    let mut size = 2;
    while size <= n {
        let half = size / 2;
        let angle = -2.0 * PI / size as f64;
        let wn = (angle.cos(), angle.sin());
        let mut start = 0;
        while start < n {
            let mut w = (1.0, 0.0);
            for k in 0..half {
                let (ur, ui) = x[start + k];
                let (vr, vi) = x[start + k + half];
                let tr = w.0 * vr - w.1 * vi;
                let ti = w.0 * vi + w.1 * vr;
                x[start + k] = (ur + tr, ui + ti);
                x[start + k + half] = (ur - tr, ui - ti);
                w = (w.0 * wn.0 - w.1 * wn.1, w.0 * wn.1 + w.1 * wn.0);
            }
            start += size;
        }
        size <<= 1;
    }
}

/// Windowed magnitude spectrum of one frame, `fft_size / 2 + 1` bins.
pub(crate) fn magnitude_spectrum(frame: &[f64], window: &[f64], fft_size: usize) -> Vec<f64> {
    let mut buf = vec![(0.0f64, 0.0f64); fft_size];
    for (i, (&s, &w)) in frame.iter().zip(window.iter()).enumerate() {
        buf[i] = (s * w, 0.0);
    }
    fft(&mut buf);

    let half = fft_size / 2 + 1;
    buf[..half]
        .iter()
        .map(|(re, im)| (re * re + im * im).sqrt())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_full_coverage() {
        let samples: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let got: Vec<&[f64]> = frames(&samples, 4, 2).collect();
        assert_eq!(got.len(), 4);
        assert_eq!(got[0], &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(got[3], &[6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn frames_short_signal_single_frame() {
        let samples = vec![1.0, 2.0, 3.0];
        let got: Vec<&[f64]> = frames(&samples, 8, 4).collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0], samples.as_slice());
    }

    #[test]
    fn frames_empty() {
        let got: Vec<&[f64]> = frames(&[], 8, 4).collect();
        assert!(got.is_empty());
    }

    #[test]
    fn hann_symmetry() {
        let w = hann_window(64);
        assert!(w[0].abs() < 1e-12);
        assert!((w[63]).abs() < 1e-12);
        for i in 0..32 {
            assert!((w[i] - w[63 - i]).abs() < 1e-12);
        }
    }

    #[test]
    fn fft_impulse_is_flat() {
        let mut buf = vec![(0.0, 0.0); 8];
        buf[0] = (1.0, 0.0);
        fft(&mut buf);
        for (re, im) in &buf {
            assert!((re - 1.0).abs() < 1e-12);
            assert!(im.abs() < 1e-12);
        }
    }

    #[test]
    fn fft_parseval() {
        let n = 16;
        let mut buf: Vec<(f64, f64)> = (0..n)
            .map(|i| ((2.0 * PI * 3.0 * i as f64 / n as f64).cos(), 0.0))
            .collect();
        let time_energy: f64 = buf.iter().map(|(r, i)| r * r + i * i).sum();
        fft(&mut buf);
        let freq_energy: f64 = buf.iter().map(|(r, i)| r * r + i * i).sum();
        assert!((time_energy * n as f64 - freq_energy).abs() < 1e-8);
    }

    #[test]
    fn magnitude_spectrum_peak_at_bin() {
        // A 4-cycle cosine in a 64-sample rectangular window peaks at bin 4.
        let n = 64;
        let frame: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 4.0 * i as f64 / n as f64).cos())
            .collect();
        let window = vec![1.0; n];
        let mags = magnitude_spectrum(&frame, &window, n);
        assert_eq!(mags.len(), n / 2 + 1);
        let peak = mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).expect("no NaN"))
            .map(|(i, _)| i)
            .expect("non-empty");
        assert_eq!(peak, 4);
    }

    #[test]
    fn next_pow2_values() {
        assert_eq!(next_pow2(1), 1);
        assert_eq!(next_pow2(2), 2);
        assert_eq!(next_pow2(3), 4);
        assert_eq!(next_pow2(2048), 2048);
        assert_eq!(next_pow2(2049), 4096);
    }
}
