//! PCM RIFF/WAVE streams.
//!
//! Reading accepts 8- and 16-bit PCM with any channel count and skips chunks
//! other than `fmt ` and `data`. Writing always produces 16-bit stereo at
//! 44.1 kHz, with the header sizes patched when the writer is finalized.

mod chunk;
mod codec;
mod format;
mod reader;
mod writer;


// Re-export public API
pub use chunk::{
    parse_header, write_header, DataLayout, DATA_SIZE_OFFSET, HEADER_LEN, RIFF_SIZE_OFFSET,
};
pub use codec::{
    clamp_sample, decode_frame, decode_sample, encode_frame, expand_u8, normalize_frame, Frame,
    SAMPLE_MAX, SAMPLE_MIN,
};
pub use format::{WavFormat, OUTPUT_BITS_PER_SAMPLE, OUTPUT_CHANNELS, OUTPUT_SAMPLE_RATE};
pub use reader::{Frames, Sample, WavReader};
pub use writer::{WavWriter, WriteSummary};
