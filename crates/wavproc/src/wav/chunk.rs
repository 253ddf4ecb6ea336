//! RIFF/WAVE header parsing and writing.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::format::WavFormat;
use crate::error::{AudioError, AudioResult};
use crate::handle::Handle;

pub(crate) const RIFF_MAGIC: &[u8; 4] = b"RIFF";
pub(crate) const WAVE_TAG: &[u8; 4] = b"WAVE";
pub(crate) const FMT_TAG: &[u8; 4] = b"fmt ";
pub(crate) const DATA_TAG: &[u8; 4] = b"data";

/// Size of the canonical header written by [`write_header`].
pub const HEADER_LEN: u64 = 44;
/// Offset of the RIFF container size field.
pub const RIFF_SIZE_OFFSET: u64 = 4;
/// Offset of the data chunk size field in the canonical header.
pub const DATA_SIZE_OFFSET: u64 = 40;

/// Bytes of the canonical header counted by the RIFF size field, minus the data.
pub(crate) const RIFF_OVERHEAD: u32 = 36;

const PCM_FORMAT: u16 = 1;
const FMT_MIN_SIZE: u32 = 16;

/// Where the sample data of a parsed stream lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLayout {
    /// Validated format of the stream.
    pub format: WavFormat,
    /// Declared size of the data chunk in bytes.
    pub data_bytes: u32,
    /// Number of whole frames in the data chunk.
    pub sample_count: u64,
    /// Offset of the first sample byte, `None` if the handle cannot seek.
    pub start_byte: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    ExpectRiffMagic,
    ExpectWaveTag,
    ScanSubchunks { format: Option<WavFormat> },
}

fn read_tag<R: Read>(reader: &mut R) -> io::Result<[u8; 4]> {
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag)?;
    Ok(tag)
}

fn skip<R: Read>(reader: &mut R, len: u64) -> io::Result<()> {
    let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if skipped < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "chunk extends past end of stream",
        ));
    }
    Ok(())
}

fn read_fmt<R: Read>(reader: &mut R) -> AudioResult<WavFormat> {
    let size = reader.read_u32::<LittleEndian>()?;
    if size < FMT_MIN_SIZE {
        return Err(AudioError::format(format!(
            "fmt chunk too short: {size} bytes"
        )));
    }

    let format_code = reader.read_u16::<LittleEndian>()?;
    if format_code != PCM_FORMAT {
        return Err(AudioError::format(format!(
            "not a PCM stream (format code {format_code})"
        )));
    }
    let channels = reader.read_u16::<LittleEndian>()?;
    let sample_rate = reader.read_u32::<LittleEndian>()?;
    let _byte_rate = reader.read_u32::<LittleEndian>()?;
    let _block_align = reader.read_u16::<LittleEndian>()?;
    let bits_per_sample = reader.read_u16::<LittleEndian>()?;

    // Extension bytes (cbSize and friends) are not interpreted.
    skip(reader, u64::from(size - FMT_MIN_SIZE))?;

    let format = WavFormat::new(channels, sample_rate, bits_per_sample);
    format.validate()?;
    Ok(format)
}

/// Parses the container header, leaving `reader` at the first sample byte.
///
/// Chunks other than `fmt ` and `data` are skipped without interpretation.
/// Parsing stops at the data chunk; anything after it is never read.
pub fn parse_header<R: Read + Handle>(reader: &mut R) -> AudioResult<DataLayout> {
    let mut state = ParseState::ExpectRiffMagic;

    loop {
        state = match state {
            ParseState::ExpectRiffMagic => {
                if &read_tag(reader)? != RIFF_MAGIC {
                    return Err(AudioError::format("not a RIFF file"));
                }
                let _riff_size = reader.read_u32::<LittleEndian>()?;
                ParseState::ExpectWaveTag
            }
            ParseState::ExpectWaveTag => {
                if &read_tag(reader)? != WAVE_TAG {
                    return Err(AudioError::format("not a WAVE file"));
                }
                ParseState::ScanSubchunks { format: None }
            }
            ParseState::ScanSubchunks { format } => {
                let tag = match read_tag(reader) {
                    Ok(tag) => tag,
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                        return Err(AudioError::format("stream has no data chunk"));
                    }
                    Err(e) => return Err(e.into()),
                };

                match &tag {
                    FMT_TAG => ParseState::ScanSubchunks {
                        format: Some(read_fmt(reader)?),
                    },
                    DATA_TAG => {
                        let format = format.ok_or_else(|| {
                            AudioError::sequence("data chunk appeared before the \"fmt \" chunk")
                        })?;
                        let data_bytes = reader.read_u32::<LittleEndian>()?;
                        let sample_count =
                            u64::from(data_bytes) / u64::from(format.block_align());
                        let start_byte = reader.tell()?;

                        tracing::debug!(
                            channels = format.channels,
                            sample_rate = format.sample_rate,
                            bits_per_sample = format.bits_per_sample,
                            sample_count,
                            seekable = start_byte.is_some(),
                            "parsed WAVE header"
                        );

                        return Ok(DataLayout {
                            format,
                            data_bytes,
                            sample_count,
                            start_byte,
                        });
                    }
                    _ => {
                        let size = reader.read_u32::<LittleEndian>()?;
                        tracing::trace!(
                            chunk = %String::from_utf8_lossy(&tag),
                            size,
                            "skipping chunk"
                        );
                        skip(reader, u64::from(size))?;
                        ParseState::ScanSubchunks { format }
                    }
                }
            }
        };
    }
}

fn header_field<T, U: TryFrom<T>>(value: T, field: &str) -> io::Result<U> {
    U::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{field} does not fit in the WAV header"),
        )
    })
}

/// Writes the canonical 44-byte header for `format` with the given data size.
pub fn write_header<W: Write>(writer: &mut W, format: &WavFormat, data_bytes: u32) -> io::Result<()> {
    write_fields(
        writer,
        format,
        RIFF_OVERHEAD.saturating_add(data_bytes),
        data_bytes,
    )
}

/// Writes a header whose two size fields are still zero.
pub(crate) fn write_placeholder_header<W: Write>(writer: &mut W, format: &WavFormat) -> io::Result<()> {
    write_fields(writer, format, 0, 0)
}

fn write_fields<W: Write>(
    writer: &mut W,
    format: &WavFormat,
    riff_bytes: u32,
    data_bytes: u32,
) -> io::Result<()> {
    // RIFF header
    writer.write_all(RIFF_MAGIC)?;
    writer.write_u32::<LittleEndian>(riff_bytes)?;
    writer.write_all(WAVE_TAG)?;

    // fmt chunk
    writer.write_all(FMT_TAG)?;
    writer.write_u32::<LittleEndian>(FMT_MIN_SIZE)?;
    writer.write_u16::<LittleEndian>(PCM_FORMAT)?;
    writer.write_u16::<LittleEndian>(format.channels)?;
    writer.write_u32::<LittleEndian>(format.sample_rate)?;
    writer.write_u32::<LittleEndian>(header_field(format.byte_rate(), "byte rate")?)?;
    writer.write_u16::<LittleEndian>(header_field(format.block_align(), "block align")?)?;
    writer.write_u16::<LittleEndian>(format.bits_per_sample)?;

    // data chunk
    writer.write_all(DATA_TAG)?;
    writer.write_u32::<LittleEndian>(data_bytes)?;

    Ok(())
}
