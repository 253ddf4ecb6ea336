//! wavproc
//!
//! A small engine for uncompressed PCM audio in the RIFF/WAVE container:
//!
//! - [`WavReader`] - parses a stream header and reads frames sequentially or by
//!   index, on seekable and forward-only handles alike
//! - [`WavWriter`] - appends 16-bit stereo 44.1 kHz frames and patches the
//!   header sizes when finalized
//! - [`Session`] - combines named input streams into one output, one frame
//!   per step, through a caller-supplied combinator
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use wavproc::{Sample, Session, WavReader, WavWriter};
//!
//! let mut writer = WavWriter::create(Cursor::new(Vec::new()))?;
//! writer.append(&[1000, -1000])?;
//! writer.append(&[2000, -2000])?;
//! let (mut tone, _summary) = writer.finalize()?;
//! tone.set_position(0);
//!
//! let mut session = Session::new().with_input("tone", WavReader::open(tone)?);
//! let mut louder = session.process(Cursor::new(Vec::new()), |inputs, _step| {
//!     let next = inputs.get_mut("tone")?.get_next(1)?;
//!     Ok(match next.into_iter().next() {
//!         Some(Sample::Frame(frame)) => Sample::Frame(frame.iter().map(|v| v * 2).collect()),
//!         _ => Sample::Eof,
//!     })
//! })?;
//!
//! assert_eq!(louder.sample_count(), 2);
//! assert_eq!(louder.get_next(1)?, vec![Sample::Frame(vec![2000, -2000])]);
//! # Ok::<(), wavproc::AudioError>(())
//! ```
//!
//! # Crate Structure
//!
//! - [`wav`] - container parsing, sample codec, reader and writer
//! - [`engine`] - the multi-input processing loop
//! - [`handle`] - byte handles with optional seek support
//! - [`error`] - error taxonomy

pub mod engine;
pub mod error;
pub mod handle;
pub mod wav;

// Re-export main types at crate root
pub use engine::{process, Inputs, Session};
pub use error::{AudioError, AudioResult};
pub use handle::{Handle, Reopen, Source, Unseekable};
pub use wav::{Frame, Sample, WavFormat, WavReader, WavWriter, WriteSummary};
