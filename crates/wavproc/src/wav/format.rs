//! WAV format descriptor.

use serde::{Deserialize, Serialize};

use crate::error::{AudioError, AudioResult};

/// Channel count of every stream produced by the writer.
pub const OUTPUT_CHANNELS: u16 = 2;
/// Sample rate of every stream produced by the writer.
pub const OUTPUT_SAMPLE_RATE: u32 = 44_100;
/// Bit depth of every stream produced by the writer.
pub const OUTPUT_BITS_PER_SAMPLE: u16 = 16;

/// WAV format parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WavFormat {
    /// Number of channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample (8 or 16 when reading, always 16 when writing).
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Creates a format descriptor without validating it.
    pub fn new(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample,
        }
    }

    /// The fixed output format: stereo, 44.1 kHz, 16 bit.
    pub fn cd_quality() -> Self {
        Self::new(OUTPUT_CHANNELS, OUTPUT_SAMPLE_RATE, OUTPUT_BITS_PER_SAMPLE)
    }

    /// Checks that samples in this format can be decoded.
    pub fn validate(&self) -> AudioResult<()> {
        if self.channels == 0 {
            return Err(AudioError::format("format declares zero channels"));
        }
        match self.bits_per_sample {
            8 | 16 => Ok(()),
            bits => Err(AudioError::format(format!(
                "unsupported bits per sample: {bits}"
            ))),
        }
    }

    /// Calculates bytes per sample (per channel).
    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    /// Calculates block align (bytes per sample frame).
    ///
    /// Widened past the `u16` header field, which overflows for very high
    /// channel counts.
    pub fn block_align(&self) -> u32 {
        u32::from(self.channels) * u32::from(self.bytes_per_sample())
    }

    /// Calculates byte rate (bytes per second).
    pub fn byte_rate(&self) -> u64 {
        u64::from(self.sample_rate) * u64::from(self.block_align())
    }
}

impl Default for WavFormat {
    fn default() -> Self {
        Self::cd_quality()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cd_quality() {
        let format = WavFormat::cd_quality();
        assert_eq!(format.channels, 2);
        assert_eq!(format.sample_rate, 44100);
        assert_eq!(format.bits_per_sample, 16);
        assert_eq!(format.block_align(), 4);
        assert_eq!(format.byte_rate(), 176400);
    }

    #[test]
    fn test_eight_bit_mono() {
        let format = WavFormat::new(1, 8000, 8);
        assert_eq!(format.bytes_per_sample(), 1);
        assert_eq!(format.block_align(), 1);
        assert_eq!(format.byte_rate(), 8000);
        assert!(format.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unsupported() {
        assert!(WavFormat::new(0, 44100, 16).validate().is_err());
        assert!(WavFormat::new(2, 44100, 24).validate().is_err());
        assert!(WavFormat::new(2, 44100, 32).validate().is_err());
    }

    #[test]
    fn test_sizes_do_not_overflow_for_wide_formats() {
        let format = WavFormat::new(40000, 96000, 16);
        assert!(format.validate().is_ok());
        assert_eq!(format.block_align(), 80000);
        assert_eq!(format.byte_rate(), 7_680_000_000);
    }
}
