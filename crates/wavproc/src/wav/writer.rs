//! Streaming WAV writer with deferred header finalization.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};

use super::chunk::{
    write_placeholder_header, DATA_SIZE_OFFSET, HEADER_LEN, RIFF_OVERHEAD, RIFF_SIZE_OFFSET,
};
use super::codec::{encode_frame, normalize_frame};
use super::format::WavFormat;
use crate::error::{AudioError, AudioResult};
use crate::handle::Handle;

/// Summary of a finalized output stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    /// Format of the written stream.
    pub format: WavFormat,
    /// Number of frames appended.
    pub frames: u64,
    /// Value patched into the data chunk size field.
    pub data_bytes: u32,
    /// Value patched into the RIFF size field.
    pub riff_bytes: u32,
    /// BLAKE3 hash of the sample bytes only (header excluded).
    pub pcm_hash: String,
}

impl WriteSummary {
    /// Returns the duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.frames as f64 / self.format.sample_rate as f64
    }
}

/// Appends frames to a 16-bit stereo 44.1 kHz RIFF/WAVE stream.
///
/// The header is written up front with zero size fields and patched when the
/// writer is finalized. Seekable handles are written through and patched in
/// place. Forward-only handles get nothing until finalization: the whole
/// stream is kept in memory so the header can be patched before the single
/// write. A writer dropped without [`WavWriter::close`] or
/// [`WavWriter::finalize`] leaves the placeholder sizes in place.
#[derive(Debug)]
pub struct WavWriter<W> {
    handle: W,
    format: WavFormat,
    position: u64,
    /// Offset of the header on a seekable handle.
    header_start: Option<u64>,
    /// Entire output, used only for forward-only handles.
    buffer: Vec<u8>,
    hasher: blake3::Hasher,
    scratch: Vec<u8>,
}

impl<W: Write + Handle> WavWriter<W> {
    /// Writes the placeholder header and prepares `handle` for appending.
    pub fn create(mut handle: W) -> AudioResult<Self> {
        let format = WavFormat::cd_quality();
        let header_start = handle.tell()?;

        let mut buffer = Vec::new();
        match header_start {
            Some(_) => write_placeholder_header(&mut handle, &format)?,
            None => write_placeholder_header(&mut buffer, &format)?,
        }

        Ok(Self {
            handle,
            format,
            position: 0,
            header_start,
            buffer,
            hasher: blake3::Hasher::new(),
            scratch: Vec::with_capacity(format.block_align() as usize),
        })
    }

    /// Format of the output (always stereo, 44.1 kHz, 16 bit).
    pub fn format(&self) -> WavFormat {
        self.format
    }

    /// Number of frames appended so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Offset of the first sample byte, `None` for forward-only handles.
    pub fn start_byte(&self) -> Option<u64> {
        self.header_start.map(|start| start + HEADER_LEN)
    }

    /// Borrows the underlying handle.
    pub fn get_ref(&self) -> &W {
        &self.handle
    }

    /// Whether the header is patched in place rather than in memory.
    pub fn is_seekable(&self) -> bool {
        self.header_start.is_some()
    }

    /// Appends one frame.
    ///
    /// The frame is truncated or padded (repeating its first value) to the
    /// output channel count, and each value is clamped to the 16-bit range.
    pub fn append(&mut self, frame: &[i32]) -> AudioResult<()> {
        let fitted = normalize_frame(frame, usize::from(self.format.channels));

        self.scratch.clear();
        encode_frame(&fitted, &mut self.scratch);
        self.hasher.update(&self.scratch);

        match self.header_start {
            Some(_) => self.handle.write_all(&self.scratch)?,
            None => self.buffer.extend_from_slice(&self.scratch),
        }
        self.position += 1;
        Ok(())
    }

    /// Appends every frame from `frames`.
    pub fn append_all<I, F>(&mut self, frames: I) -> AudioResult<()>
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[i32]>,
    {
        for frame in frames {
            self.append(frame.as_ref())?;
        }
        Ok(())
    }

    fn sizes(&self) -> AudioResult<(u32, u32)> {
        let data_bytes = self
            .position
            .checked_mul(u64::from(self.format.block_align()))
            .and_then(|bytes| u32::try_from(bytes).ok())
            .filter(|bytes| bytes.checked_add(RIFF_OVERHEAD).is_some())
            .ok_or_else(|| {
                AudioError::format(format!(
                    "{} frames exceed the RIFF size limit",
                    self.position
                ))
            })?;
        Ok((data_bytes, RIFF_OVERHEAD + data_bytes))
    }

    /// Patches the header size fields and returns the handle with a summary.
    ///
    /// The handle is flushed; on seekable handles the cursor is left at the end
    /// of the written data.
    pub fn finalize(mut self) -> AudioResult<(W, WriteSummary)> {
        let (data_bytes, riff_bytes) = self.sizes()?;

        match self.header_start {
            Some(start) => {
                self.handle.seek_to(start + RIFF_SIZE_OFFSET)?;
                self.handle.write_u32::<LittleEndian>(riff_bytes)?;
                self.handle.seek_to(start + DATA_SIZE_OFFSET)?;
                self.handle.write_u32::<LittleEndian>(data_bytes)?;
                self.handle
                    .seek_to(start + HEADER_LEN + u64::from(data_bytes))?;
            }
            None => {
                patch_u32(&mut self.buffer, RIFF_SIZE_OFFSET, riff_bytes);
                patch_u32(&mut self.buffer, DATA_SIZE_OFFSET, data_bytes);
                self.handle.write_all(&self.buffer)?;
            }
        }
        self.handle.flush()?;

        let summary = WriteSummary {
            format: self.format,
            frames: self.position,
            data_bytes,
            riff_bytes,
            pcm_hash: self.hasher.finalize().to_hex().to_string(),
        };

        tracing::debug!(
            frames = summary.frames,
            data_bytes,
            riff_bytes,
            buffered = self.header_start.is_none(),
            "finalized WAVE output"
        );

        Ok((self.handle, summary))
    }

    /// Patches the header size fields and releases the handle.
    pub fn close(self) -> AudioResult<WriteSummary> {
        let (handle, summary) = self.finalize()?;
        drop(handle);
        Ok(summary)
    }
}

fn patch_u32(buffer: &mut [u8], offset: u64, value: u32) {
    let offset = offset as usize;
    buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
