//! Per-sample and per-frame PCM conversion.
//!
//! Decoding accepts 8-bit unsigned and 16-bit signed samples and always yields
//! values in the signed 16-bit range. Encoding always produces 16-bit samples.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use super::format::WavFormat;
use crate::error::{AudioError, AudioResult};

/// Smallest encodable sample value.
pub const SAMPLE_MIN: i32 = i16::MIN as i32;
/// Largest encodable sample value.
pub const SAMPLE_MAX: i32 = i16::MAX as i32;

/// One sample value per channel at a single point in time.
pub type Frame = Vec<i32>;

/// Expands an unsigned 8-bit sample into the signed 16-bit range.
#[inline]
pub fn expand_u8(byte: u8) -> i32 {
    (i32::from(byte) - 128) * 256
}

/// Clamps a sample value into the signed 16-bit range.
#[inline]
pub fn clamp_sample(value: i32) -> i16 {
    value.clamp(SAMPLE_MIN, SAMPLE_MAX) as i16
}

/// Decodes one sample of the given bit depth from `reader`.
pub fn decode_sample<R: Read>(reader: &mut R, bits_per_sample: u16) -> AudioResult<i32> {
    match bits_per_sample {
        8 => Ok(expand_u8(reader.read_u8()?)),
        16 => Ok(i32::from(reader.read_i16::<LittleEndian>()?)),
        bits => Err(AudioError::format(format!(
            "unknown bits per sample: {bits}"
        ))),
    }
}

/// Decodes one interleaved frame (one sample per channel).
pub fn decode_frame<R: Read>(reader: &mut R, format: &WavFormat) -> AudioResult<Frame> {
    (0..format.channels)
        .map(|_| decode_sample(reader, format.bits_per_sample))
        .collect()
}

/// Fits a caller-provided frame to `channels` values.
///
/// Longer frames are truncated; shorter frames are padded by repeating their
/// first value (or silence for an empty frame).
pub fn normalize_frame(frame: &[i32], channels: usize) -> Frame {
    let fill = frame.first().copied().unwrap_or(0);
    let mut fitted: Frame = frame.iter().copied().take(channels).collect();
    fitted.resize(channels, fill);
    fitted
}

/// Appends the 16-bit little-endian encoding of `frame` to `out`, clamping each value.
pub fn encode_frame(frame: &[i32], out: &mut Vec<u8>) {
    out.reserve(frame.len() * 2);
    for &value in frame {
        out.extend_from_slice(&clamp_sample(value).to_le_bytes());
    }
}
