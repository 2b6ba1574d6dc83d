use audiopus::coder::Encoder;
use audiopus::{Application, Channels, SampleRate};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use transkh_core::TARGET_SAMPLE_RATE;

const OPUS_PRE_SKIP: u16 = 312;
const OPUS_FRAME: usize = 960;

fn padded_stereo_wav(rate: u32) -> Vec<u8> {
    let spec = WavSpec {
        channels: 2,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let silence = rate as usize / 2;
    let voiced = rate as usize;
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..(silence + voiced + silence) {
            let v = if i >= silence && i < silence + voiced {
                let t = (i - silence) as f32 / rate as f32;
                (0.6 * (2.0 * std::f32::consts::PI * 300.0 * t).sin() * 32767.0) as i16
            } else {
                0
            };
            writer.write_sample(v).unwrap();
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[test]
fn test_preprocess_44k_stereo_to_16k_mono() {
    let bytes = padded_stereo_wav(44100);
    let prepared = transkh_audio::preprocess(&bytes).unwrap();

    assert_eq!(prepared.resampled.sample_rate(), TARGET_SAMPLE_RATE);
    // 2 seconds in, 2 seconds out
    assert_eq!(prepared.resampled.samples().len(), 32000);

    let trimmed = prepared.trimmed.samples().len();
    assert!(trimmed < 32000, "silence was not trimmed: {trimmed}");
    assert!(trimmed >= 15000, "voiced part was cut: {trimmed}");
}

#[test]
fn test_preprocess_is_deterministic() {
    let bytes = padded_stereo_wav(8000);
    let a = transkh_audio::preprocess(&bytes).unwrap();
    let b = transkh_audio::preprocess(&bytes).unwrap();
    assert_eq!(a.resampled, b.resampled);
    assert_eq!(a.trimmed, b.trimmed);
}

#[test]
fn test_resampled_audio_streams_as_pcm16() {
    let bytes = padded_stereo_wav(16000);
    let prepared = transkh_audio::preprocess(&bytes).unwrap();
    let pcm = transkh_audio::encode_i16_le(prepared.resampled.samples());
    assert_eq!(pcm.len(), prepared.resampled.samples().len() * 2);
}

fn ogg_crc(data: &[u8]) -> u32 {
    let mut crc = 0u32;
    for &b in data {
        crc ^= (b as u32) << 24;
        for _ in 0..8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ 0x04c1_1db7
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn ogg_page(packet: &[u8], header_type: u8, granule: u64, sequence: u32) -> Vec<u8> {
    let mut lacing = vec![255u8; packet.len() / 255];
    lacing.push((packet.len() % 255) as u8);

    let mut page = Vec::new();
    page.extend_from_slice(b"OggS");
    page.push(0);
    page.push(header_type);
    page.extend_from_slice(&granule.to_le_bytes());
    page.extend_from_slice(&0x7e57_u32.to_le_bytes());
    page.extend_from_slice(&sequence.to_le_bytes());
    page.extend_from_slice(&[0; 4]);
    page.push(lacing.len() as u8);
    page.extend_from_slice(&lacing);
    page.extend_from_slice(packet);

    let crc = ogg_crc(&page);
    page[22..26].copy_from_slice(&crc.to_le_bytes());
    page
}

/// Mono 48 kHz OGG/Opus, one 20 ms packet per page, as voice notes arrive.
fn ogg_opus(samples: &[i16]) -> Vec<u8> {
    let mut head = b"OpusHead".to_vec();
    head.push(1);
    head.push(1);
    head.extend_from_slice(&OPUS_PRE_SKIP.to_le_bytes());
    head.extend_from_slice(&48000u32.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes());
    head.push(0);

    let vendor = b"transkh tests";
    let mut tags = b"OpusTags".to_vec();
    tags.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    tags.extend_from_slice(vendor);
    tags.extend_from_slice(&0u32.to_le_bytes());

    let mut out = ogg_page(&head, 0x02, 0, 0);
    out.extend(ogg_page(&tags, 0x00, 0, 1));

    let encoder = Encoder::new(SampleRate::Hz48000, Channels::Mono, Application::Audio).unwrap();
    let frames: Vec<&[i16]> = samples.chunks_exact(OPUS_FRAME).collect();
    let mut granule = OPUS_PRE_SKIP as u64;
    for (i, frame) in frames.iter().enumerate() {
        let mut packet = vec![0u8; 4000];
        let len = encoder.encode(frame, &mut packet).unwrap();
        granule += OPUS_FRAME as u64;
        let header_type = if i + 1 == frames.len() { 0x04 } else { 0x00 };
        out.extend(ogg_page(&packet[..len], header_type, granule, i as u32 + 2));
    }
    out
}

fn voiced_48k(seconds: usize) -> Vec<i16> {
    let rate = 48000usize;
    let silence = rate / 2;
    (0..silence + seconds * rate + silence)
        .map(|i| {
            if i >= silence && i < silence + seconds * rate {
                let t = (i - silence) as f32 / rate as f32;
                (0.5 * (2.0 * std::f32::consts::PI * 300.0 * t).sin() * 32767.0) as i16
            } else {
                0
            }
        })
        .collect()
}

#[test]
fn test_preprocess_ogg_opus_voice_note() {
    let samples = voiced_48k(1);
    let bytes = ogg_opus(&samples);
    assert!(bytes.starts_with(b"OggS"));

    let prepared = transkh_audio::preprocess(&bytes).unwrap();
    assert_eq!(prepared.resampled.sample_rate(), TARGET_SAMPLE_RATE);

    // 2 s at 48 kHz less the encoder pre-skip.
    let expected = (samples.len() - OPUS_PRE_SKIP as usize) / 3;
    let len = prepared.resampled.samples().len();
    // Within one 20 ms packet of the encoded length.
    assert!(len.abs_diff(expected) <= 320, "expected ~{expected} samples, got {len}");

    let peak = prepared
        .resampled
        .samples()
        .iter()
        .fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.2, "decoded audio too quiet: {peak}");

    let trimmed = prepared.trimmed.samples().len();
    assert!(trimmed < len, "silence was not trimmed: {trimmed}");
    assert!(trimmed >= 15000, "voiced part was cut: {trimmed}");
}

#[test]
fn test_decode_ogg_opus_is_48k() {
    let bytes = ogg_opus(&voiced_48k(1));
    let audio = transkh_audio::decode(&bytes).unwrap();
    assert_eq!(audio.sample_rate(), 48000);
    let len = audio.samples().len();
    assert!(
        len.abs_diff(96000 - OPUS_PRE_SKIP as usize) <= OPUS_FRAME,
        "unexpected length {len}"
    );
}

#[test]
fn test_preprocess_rejects_garbage() {
    let err = transkh_audio::preprocess(b"\x00\x01 definitely not audio").unwrap_err();
    assert!(matches!(err, transkh_core::AudioError::Decode(_)));
}
