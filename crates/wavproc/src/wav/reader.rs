//! Sequential and random-access frame reader.

use std::io::Read;
use std::time::Duration;

use super::chunk::parse_header;
use super::codec::{decode_frame, Frame};
use super::format::WavFormat;
use crate::error::{AudioError, AudioResult};
use crate::handle::{scoped_seek, Handle};

/// One item pulled from a stream: a frame, or the end-of-stream marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sample {
    /// A decoded frame.
    Frame(Frame),
    /// No more frames are available.
    Eof,
}

impl Sample {
    /// Returns true for the end-of-stream marker.
    pub fn is_eof(&self) -> bool {
        matches!(self, Sample::Eof)
    }

    /// Returns the frame, or `None` at end of stream.
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            Sample::Frame(frame) => Some(frame),
            Sample::Eof => None,
        }
    }

    /// Borrows the frame, or `None` at end of stream.
    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Sample::Frame(frame) => Some(frame),
            Sample::Eof => None,
        }
    }
}

impl From<Frame> for Sample {
    fn from(frame: Frame) -> Self {
        Sample::Frame(frame)
    }
}

/// Reads PCM frames from a parsed RIFF/WAVE stream.
///
/// Random access through [`WavReader::index`] depends on the handle: seekable
/// handles read the requested frame in place and leave the sequential cursor
/// untouched, forward-only handles consume the frames in between.
#[derive(Debug)]
pub struct WavReader<R> {
    handle: R,
    format: WavFormat,
    sample_count: u64,
    position: u64,
    start_byte: Option<u64>,
    /// Most recently decoded sequential frame.
    current: Option<Frame>,
}

impl<R: Read + Handle> WavReader<R> {
    /// Parses the header of `handle` and prepares it for reading.
    pub fn open(mut handle: R) -> AudioResult<Self> {
        let layout = parse_header(&mut handle)?;
        Ok(Self {
            handle,
            format: layout.format,
            sample_count: layout.sample_count,
            position: 0,
            start_byte: layout.start_byte,
            current: None,
        })
    }

    /// Format of the stream.
    pub fn format(&self) -> WavFormat {
        self.format
    }

    /// Number of channels per frame.
    pub fn channels(&self) -> u16 {
        self.format.channels
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    /// Bit depth of the stored samples.
    pub fn bits_per_sample(&self) -> u16 {
        self.format.bits_per_sample
    }

    /// Total number of frames in the stream.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Index of the next frame returned by [`WavReader::get_next`].
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Frames left before end of stream.
    pub fn remaining(&self) -> u64 {
        self.sample_count - self.position
    }

    /// Offset of the first sample byte, `None` for forward-only handles.
    pub fn start_byte(&self) -> Option<u64> {
        self.start_byte
    }

    /// Whether random access can seek instead of consuming frames.
    pub fn is_seekable(&self) -> bool {
        self.start_byte.is_some()
    }

    /// Playback length of the whole stream.
    pub fn duration(&self) -> Duration {
        if self.format.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.sample_count as f64 / f64::from(self.format.sample_rate))
    }

    /// The frame most recently returned by a sequential read.
    pub fn current(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    /// Reads up to `n` frames from the current position.
    ///
    /// When the stream runs out, a single [`Sample::Eof`] is pushed and reading
    /// stops, so the result is shorter than `n` only if it ends with the marker.
    pub fn get_next(&mut self, n: usize) -> AudioResult<Vec<Sample>> {
        let mut samples = Vec::with_capacity(n);
        for _ in 0..n {
            match self.next_frame()? {
                Some(frame) => samples.push(Sample::Frame(frame)),
                None => {
                    samples.push(Sample::Eof);
                    break;
                }
            }
        }
        Ok(samples)
    }

    /// Reads the frame at the current position, or `None` at end of stream.
    pub fn next_frame(&mut self) -> AudioResult<Option<Frame>> {
        if self.position >= self.sample_count {
            return Ok(None);
        }
        let frame = decode_frame(&mut self.handle, &self.format)?;
        self.current = Some(frame.clone());
        self.position += 1;
        Ok(Some(frame))
    }

    /// Random access to frame `sample`.
    ///
    /// On a seekable handle the frame is read in place and later sequential
    /// reads are unaffected; a `sample` past the end yields [`Sample::Eof`].
    ///
    /// On a forward-only handle the reader can only move ahead:
    /// - `sample == position()` returns [`WavReader::current`] without reading;
    /// - `sample > position()` consumes `sample - position()` frames, leaving
    ///   `position() == sample`, and returns the last frame read (or
    ///   [`Sample::Eof`] if the stream ran out first);
    /// - `sample < position()` is a sequence error.
    pub fn index(&mut self, sample: u64) -> AudioResult<Sample> {
        match self.start_byte {
            Some(_) if sample >= self.sample_count => Ok(Sample::Eof),
            Some(start_byte) => self.read_at(start_byte, sample).map(Sample::Frame),
            None => self.read_forward(sample),
        }
    }

    fn read_at(&mut self, start_byte: u64, sample: u64) -> AudioResult<Frame> {
        let saved = self
            .handle
            .tell()?
            .ok_or_else(|| AudioError::sequence("handle stopped reporting its offset"))?;
        let offset = start_byte + sample * u64::from(self.format.block_align());
        let format = self.format;

        // `position` is left alone; only the raw cursor moves.
        scoped_seek(&mut self.handle, saved, offset, |handle| {
            decode_frame(handle, &format)
        })
    }

    fn read_forward(&mut self, sample: u64) -> AudioResult<Sample> {
        if sample < self.position {
            return Err(AudioError::sequence(format!(
                "stream cannot rewind from frame {} to frame {sample}",
                self.position
            )));
        }

        if sample > self.position {
            let gap = usize::try_from(sample - self.position)
                .map_err(|_| AudioError::sequence("seek distance exceeds addressable range"))?;
            if self.get_next(gap)?.last().is_some_and(Sample::is_eof) {
                return Ok(Sample::Eof);
            }
        }

        self.current
            .clone()
            .map(Sample::Frame)
            .ok_or_else(|| AudioError::sequence("no frame has been read yet"))
    }

    /// Lazily yields frames from the current position until end of stream.
    ///
    /// The iterator starts wherever the reader is; call [`WavReader::rewind`]
    /// first to start over from frame 0.
    pub fn frames(&mut self) -> Frames<'_, R> {
        Frames {
            reader: self,
            done: false,
        }
    }

    /// Moves back to frame 0. Only possible on seekable handles.
    pub fn rewind(&mut self) -> AudioResult<()> {
        let start_byte = self
            .start_byte
            .ok_or_else(|| AudioError::sequence("stream cannot rewind"))?;
        self.handle.seek_to(start_byte)?;
        self.position = 0;
        self.current = None;
        Ok(())
    }

    /// Releases the reader and returns the underlying handle.
    pub fn into_inner(self) -> R {
        self.handle
    }

    /// Releases the underlying handle.
    pub fn close(self) {
        drop(self.handle);
    }
}

/// Iterator over the remaining frames of a [`WavReader`].
pub struct Frames<'a, R> {
    reader: &'a mut WavReader<R>,
    done: bool,
}

impl<R: Read + Handle> Iterator for Frames<'_, R> {
    type Item = AudioResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = usize::try_from(self.reader.remaining()).unwrap_or(usize::MAX);
        (0, Some(remaining))
    }
}
