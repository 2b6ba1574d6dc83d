//! Normalisation applied to every inbound voice message before recognition.
//!
//! The trim follows the usual energy-gate recipe: centred 2048-sample frames
//! every 512 samples, each frame's RMS compared in dB against the loudest frame.

use crate::decode;
use rubato::{FftFixedIn, Resampler};
use transkh_core::{AudioError, AudioSample, TARGET_SAMPLE_RATE};

/// Frames quieter than this, relative to the loudest frame, count as silence.
pub const TRIM_TOP_DB: f32 = 20.0;

const FRAME_LENGTH: usize = 2048;
const HOP_LENGTH: usize = 512;
const RESAMPLE_CHUNK: usize = 1024;
const RESAMPLE_SUB_CHUNKS: usize = 2;
const MAX_FLUSHES: usize = 8;
const POWER_FLOOR: f64 = 1e-10;

/// Output of [`preprocess`]: the whole utterance at 16 kHz, and the same signal with
/// leading/trailing silence removed.
#[derive(Debug, Clone)]
pub struct PreparedAudio {
    pub resampled: AudioSample,
    pub trimmed: AudioSample,
}

/// Decode, resample to 16 kHz, and trim silence.
pub fn preprocess(bytes: &[u8]) -> Result<PreparedAudio, AudioError> {
    let decoded = decode::decode(bytes)?;
    let resampled = resample(&decoded, TARGET_SAMPLE_RATE)?;
    let trimmed = trim_silence(&resampled, TRIM_TOP_DB);

    tracing::debug!(
        input_rate = decoded.sample_rate(),
        input_secs = decoded.duration().as_secs_f32(),
        trimmed_secs = trimmed.duration().as_secs_f32(),
        "audio preprocessed"
    );
    Ok(PreparedAudio { resampled, trimmed })
}

/// Resample a mono signal to `target_rate`, preserving its duration.
pub fn resample(audio: &AudioSample, target_rate: u32) -> Result<AudioSample, AudioError> {
    let input = audio.samples();
    if audio.sample_rate() == target_rate || input.is_empty() {
        return Ok(AudioSample::new(input.to_vec(), target_rate));
    }
    if audio.sample_rate() == 0 {
        return Err(AudioError::Resample("input sample rate is zero".to_string()));
    }

    let mut resampler = FftFixedIn::<f32>::new(
        audio.sample_rate() as usize,
        target_rate as usize,
        RESAMPLE_CHUNK,
        RESAMPLE_SUB_CHUNKS,
        1,
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    let expected_len =
        (input.len() as f64 * target_rate as f64 / audio.sample_rate() as f64).ceil() as usize;
    let mut out = Vec::with_capacity(expected_len + RESAMPLE_CHUNK);

    for chunk in input.chunks(RESAMPLE_CHUNK) {
        let mut block = vec![0.0f32; RESAMPLE_CHUNK];
        block[..chunk.len()].copy_from_slice(chunk);
        let frames = resampler
            .process(&[block], None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        out.extend_from_slice(&frames[0]);
    }

    // Output starts `delay` frames late; flush until the delayed tail is out, then realign.
    let delay = resampler.output_delay();
    let mut flushes = 0;
    while out.len() < expected_len + delay && flushes < MAX_FLUSHES {
        let frames = resampler
            .process(&[vec![0.0f32; RESAMPLE_CHUNK]], None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        out.extend_from_slice(&frames[0]);
        flushes += 1;
    }
    out.drain(..delay.min(out.len()));
    out.resize(expected_len, 0.0);

    Ok(AudioSample::new(out, target_rate))
}

/// Per-frame mean square energy over centred, zero-padded frames.
fn frame_power(samples: &[f32]) -> Vec<f64> {
    let half = FRAME_LENGTH / 2;
    let mut prefix = Vec::with_capacity(samples.len() + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for &s in samples {
        acc += (s as f64) * (s as f64);
        prefix.push(acc);
    }

    let n_frames = 1 + samples.len() / HOP_LENGTH;
    (0..n_frames)
        .map(|i| {
            let centre = i * HOP_LENGTH;
            let start = centre.saturating_sub(half);
            let end = (centre + half).min(samples.len());
            let energy = if end > start {
                prefix[end] - prefix[start]
            } else {
                0.0
            };
            energy / FRAME_LENGTH as f64
        })
        .collect()
}

/// Drop leading and trailing frames more than `top_db` below the loudest frame.
pub fn trim_silence(audio: &AudioSample, top_db: f32) -> AudioSample {
    let samples = audio.samples();
    if samples.is_empty() {
        return audio.clone();
    }

    let power = frame_power(samples);
    let reference = power.iter().cloned().fold(0.0f64, f64::max);
    let ref_db = 10.0 * reference.max(POWER_FLOOR).log10();
    let threshold = -(top_db as f64);

    let loud = |p: &f64| 10.0 * p.max(POWER_FLOOR).log10() - ref_db > threshold;
    let first = power.iter().position(loud);
    let last = power.iter().rposition(loud);

    match (first, last) {
        (Some(first), Some(last)) => {
            let start = (first * HOP_LENGTH).min(samples.len());
            let end = ((last + 1) * HOP_LENGTH).min(samples.len());
            AudioSample::new(samples[start..end].to_vec(), audio.sample_rate())
        }
        _ => AudioSample::new(Vec::new(), audio.sample_rate()),
    }
}
