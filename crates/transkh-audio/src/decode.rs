//! Container sniffing for inbound voice messages.
//!
//! RIFF/WAVE goes through hound. Everything else is probed with symphonia; Opus
//! tracks (Telegram voice notes are OGG/Opus) are decoded with libopus since
//! symphonia has no Opus codec.

use crate::wav;
use audiopus::coder::Decoder as OpusDecoder;
use audiopus::packet::Packet as OpusPacket;
use audiopus::{Channels, MutSignals, SampleRate};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, DecoderOptions, CODEC_TYPE_NULL, CODEC_TYPE_OPUS};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use transkh_core::{AudioError, AudioSample};

/// Opus always decodes at 48 kHz.
const OPUS_SAMPLE_RATE: u32 = 48_000;
/// 120 ms at 48 kHz, the longest Opus packet.
const OPUS_MAX_FRAME: usize = 5760;

/// Decode a voice message in any supported container into a mono sample.
pub fn decode(bytes: &[u8]) -> Result<AudioSample, AudioError> {
    if is_wav(bytes) {
        return wav::decode(bytes);
    }

    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(format!("unrecognised container: {e}")))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode("no audio track".to_string()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let audio = if params.codec == CODEC_TYPE_OPUS {
        decode_opus(format.as_mut(), track_id, &params)?
    } else {
        decode_track(format.as_mut(), track_id, &params)?
    };

    tracing::trace!(
        codec = ?params.codec,
        sample_rate = audio.sample_rate(),
        frames = audio.samples().len(),
        "decoded compressed audio"
    );
    Ok(audio)
}

fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Next packet of `track_id`, or `None` at end of stream.
fn next_packet(format: &mut dyn FormatReader, track_id: u32) -> Result<Option<Packet>, AudioError> {
    loop {
        match format.next_packet() {
            Ok(packet) if packet.track_id() == track_id => return Ok(Some(packet)),
            Ok(_) => continue,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(None)
            }
            Err(e) => return Err(AudioError::Decode(e.to_string())),
        }
    }
}

fn decode_track(
    format: &mut dyn FormatReader,
    track_id: u32,
    params: &CodecParameters,
) -> Result<AudioSample, AudioError> {
    let mut decoder = symphonia::default::get_codecs()
        .make(params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("unsupported codec: {e}")))?;

    let mut sample_rate = params.sample_rate;
    let mut mono = Vec::new();
    while let Some(packet) = next_packet(format, track_id)? {
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!("skipping corrupt packet: {e}");
                continue;
            }
            Err(e) => return Err(AudioError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        if sample_rate.is_none() {
            sample_rate = Some(spec.rate);
        }
        let channels = spec.channels.count().max(1);
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        mono.extend(
            buf.samples()
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
        );
    }

    let sample_rate =
        sample_rate.ok_or_else(|| AudioError::Decode("unknown sample rate".to_string()))?;
    Ok(AudioSample::new(mono, sample_rate))
}

fn decode_opus(
    format: &mut dyn FormatReader,
    track_id: u32,
    params: &CodecParameters,
) -> Result<AudioSample, AudioError> {
    let pre_skip = params
        .extra_data
        .as_deref()
        .and_then(opus_pre_skip)
        .unwrap_or(0);

    // A mono decoder downmixes stereo streams itself.
    let mut decoder = OpusDecoder::new(SampleRate::Hz48000, Channels::Mono).map_err(opus_error)?;
    let mut frame = vec![0i16; OPUS_MAX_FRAME];
    let mut pcm = Vec::new();

    while let Some(packet) = next_packet(format, track_id)? {
        let data = packet.buf();
        if data.is_empty() || data.starts_with(b"OpusHead") || data.starts_with(b"OpusTags") {
            continue;
        }
        let input = OpusPacket::try_from(data).map_err(opus_error)?;
        let output = MutSignals::try_from(&mut frame[..]).map_err(opus_error)?;
        let n = decoder.decode(Some(input), output, false).map_err(opus_error)?;
        pcm.extend(frame[..n].iter().map(|&s| s as f32 / 32768.0));
    }

    pcm.drain(..pre_skip.min(pcm.len()));
    Ok(AudioSample::new(pcm, OPUS_SAMPLE_RATE))
}

/// Pre-skip from an `OpusHead` identification header.
fn opus_pre_skip(head: &[u8]) -> Option<usize> {
    if head.len() < 19 || !head.starts_with(b"OpusHead") {
        return None;
    }
    Some(u16::from_le_bytes([head[10], head[11]]) as usize)
}

fn opus_error(e: audiopus::Error) -> AudioError {
    AudioError::Decode(format!("opus: {e}"))
}
