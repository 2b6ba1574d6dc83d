/// Clamp to [-1, 1], scale by 32767 and truncate.
pub fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Raw 16-bit little-endian PCM, as streamed to remote recognizers.
pub fn encode_i16_le(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        bytes.extend_from_slice(&to_i16(s).to_le_bytes());
    }
    bytes
}
