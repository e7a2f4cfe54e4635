//! Symphonia-based container decoding.
//!
//! Probes the container format, decodes the default audio track packet by
//! packet, and downmixes interleaved multi-channel audio to mono by channel
//! averaging. The native sample rate is preserved.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::DecodeError;
use crate::waveform::Waveform;

/// Decodes an audio file to a mono [`Waveform`] at its native sample rate.
pub fn decode_file(path: &Path) -> Result<Waveform, DecodeError> {
    let file = File::open(path)?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    decode_source(Box::new(file), hint)
}

/// Decodes in-memory audio bytes (e.g. an HTTP upload body) to a mono
/// [`Waveform`] at its native sample rate.
pub fn decode_bytes(data: Vec<u8>) -> Result<Waveform, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::Empty);
    }
    decode_source(Box::new(Cursor::new(data)), Hint::new())
}

fn decode_source(source: Box<dyn MediaSource>, hint: Hint) -> Result<Waveform, DecodeError> {
    let stream = MediaSourceStream::new(source, Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Probe(e.to_string()))?;

    let mut format = probed.format;

    let track = format.default_track().ok_or(DecodeError::NoAudioTrack)?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::UnknownSampleRate)?;
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1);
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Decode(e.to_string()))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(DecodeError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt packets are skipped; a fully corrupt stream still
                // ends up empty and errors below.
                tracing::warn!("skipping undecodable packet: {e}");
                continue;
            }
            Err(e) => return Err(DecodeError::Decode(e.to_string())),
        };

        let needs_realloc = match &sample_buf {
            Some(b) => b.capacity() < decoded.capacity(),
            None => true,
        };
        if needs_realloc {
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, *decoded.spec()));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }
    }

    if interleaved.is_empty() {
        return Err(DecodeError::Empty);
    }

    let samples = if channels > 1 {
        downmix_to_mono(&interleaved, channels)
    } else {
        interleaved
    };

    Ok(Waveform::new(samples, sample_rate))
}

/// Averages interleaved channels into a single mono channel.
fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    let frames = interleaved.len() / channels;
    let scale = 1.0 / channels as f32;
    let mut mono = Vec::with_capacity(frames);
    for frame in interleaved.chunks_exact(channels) {
        mono.push(frame.iter().sum::<f32>() * scale);
    }
    mono
}
