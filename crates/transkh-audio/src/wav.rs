use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;
use std::path::Path;
use transkh_core::{AudioError, AudioSample};
use crate::pcm::to_i16;

/// Decode a WAV container into a mono sample, averaging channels.
pub fn decode(bytes: &[u8]) -> Result<AudioSample, AudioError> {
    let reader =
        WavReader::new(Cursor::new(bytes)).map_err(|e| AudioError::Decode(e.to_string()))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::Decode("zero channels".to_string()));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::Decode(e.to_string()))?
        }
    };

    let channels = spec.channels as usize;
    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    tracing::trace!(
        sample_rate = spec.sample_rate,
        channels,
        frames = mono.len(),
        "decoded wav"
    );
    Ok(AudioSample::new(mono, spec.sample_rate))
}

fn pcm16_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Encode mono samples as a 16-bit PCM WAV container in memory.
pub fn encode_pcm16(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, pcm16_spec(sample_rate))
            .map_err(|e| AudioError::Encode(e.to_string()))?;
        for &s in samples {
            writer
                .write_sample(to_i16(s))
                .map_err(|e| AudioError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| AudioError::Encode(e.to_string()))?;
    }
    Ok(cursor.into_inner())
}

/// Write mono samples as a 16-bit PCM WAV file.
pub fn write_pcm16(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), AudioError> {
    let bytes = encode_pcm16(samples, sample_rate)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
