//! Rubato-based sample rate conversion.
//!
//! Resampling is opt-in: the decoder always returns the native rate, and
//! callers that need a fixed rate convert explicitly.

use rubato::{FftFixedInOut, Resampler as RubatoResampler};
use thiserror::Error;

use crate::waveform::Waveform;

/// Errors returned by [`resample`].
#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("rubato error: {0}")]
    Rubato(String),

    #[error("target sample rate must be positive")]
    ZeroRate,
}

impl From<rubato::ResamplerConstructionError> for ResampleError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        ResampleError::Rubato(e.to_string())
    }
}

impl From<rubato::ResampleError> for ResampleError {
    fn from(e: rubato::ResampleError) -> Self {
        ResampleError::Rubato(e.to_string())
    }
}

/// Converts a waveform to `target_rate` Hz using an FFT resampler.
///
/// Returns a clone when the waveform is already at the target rate. The tail
/// of the signal is zero-padded up to the resampler's chunk size, and the
/// output is trimmed back to the expected length.
pub fn resample(wave: &Waveform, target_rate: u32) -> Result<Waveform, ResampleError> {
    if target_rate == 0 {
        return Err(ResampleError::ZeroRate);
    }
    if wave.sample_rate() == target_rate || wave.is_empty() {
        return Ok(Waveform::new(wave.samples().to_vec(), target_rate));
    }

    let src_rate = wave.sample_rate();
    let mut resampler =
        FftFixedInOut::<f32>::new(src_rate as usize, target_rate as usize, 1024, 1)?;

    let samples = wave.samples();
    let expected = (samples.len() as u64 * target_rate as u64 / src_rate as u64) as usize;
    let mut out: Vec<f32> = Vec::with_capacity(expected);

    let mut pos = 0;
    while pos < samples.len() {
        let need = resampler.input_frames_next();
        let mut chunk = vec![0.0f32; need];
        let take = need.min(samples.len() - pos);
        chunk[..take].copy_from_slice(&samples[pos..pos + take]);
        pos += take;

        let processed = resampler.process(&[chunk], None)?;
        out.extend_from_slice(&processed[0]);
    }

    out.truncate(expected);
    Ok(Waveform::new(out, target_rate))
}
