//! Byte handles with optional seek support.
//!
//! A stream decides its random-access strategy once, at open time, by asking the
//! handle for its current offset. Handles that cannot reposition (pipes, stdio,
//! [`Unseekable`]) answer `None`, which switches readers to forward-only access
//! and writers to in-memory buffering.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};

use crate::error::AudioResult;

/// A byte handle that reports whether it can be repositioned.
pub trait Handle {
    /// Current byte offset, or `None` when the handle cannot seek.
    fn tell(&mut self) -> io::Result<Option<u64>>;

    /// Moves the cursor to an absolute byte offset.
    fn seek_to(&mut self, offset: u64) -> io::Result<()>;
}

/// Readable handle, usable as a boxed input of any concrete type.
pub trait Source: Read + Handle {}

impl<T: Read + Handle + ?Sized> Source for T {}

fn probe<S: Seek>(seekable: &mut S) -> io::Result<Option<u64>> {
    match seekable.stream_position() {
        Ok(offset) => Ok(Some(offset)),
        Err(e) if e.kind() == io::ErrorKind::NotSeekable => Ok(None),
        Err(e) => Err(e),
    }
}

fn not_seekable() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "handle does not support seeking")
}

impl Handle for File {
    fn tell(&mut self) -> io::Result<Option<u64>> {
        probe(self)
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset)).map(|_| ())
    }
}

impl<T: AsRef<[u8]>> Handle for Cursor<T> {
    fn tell(&mut self) -> io::Result<Option<u64>> {
        Ok(Some(self.position()))
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.set_position(offset);
        Ok(())
    }
}

impl<R: Read + Seek> Handle for BufReader<R> {
    fn tell(&mut self) -> io::Result<Option<u64>> {
        probe(self)
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset)).map(|_| ())
    }
}

impl<W: Write + Seek> Handle for BufWriter<W> {
    fn tell(&mut self) -> io::Result<Option<u64>> {
        probe(self)
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset)).map(|_| ())
    }
}

impl Handle for io::Stdin {
    fn tell(&mut self) -> io::Result<Option<u64>> {
        Ok(None)
    }

    fn seek_to(&mut self, _offset: u64) -> io::Result<()> {
        Err(not_seekable())
    }
}

impl Handle for io::Stdout {
    fn tell(&mut self) -> io::Result<Option<u64>> {
        Ok(None)
    }

    fn seek_to(&mut self, _offset: u64) -> io::Result<()> {
        Err(not_seekable())
    }
}

impl<H: Handle + ?Sized> Handle for Box<H> {
    fn tell(&mut self) -> io::Result<Option<u64>> {
        (**self).tell()
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        (**self).seek_to(offset)
    }
}

impl<H: Handle + ?Sized> Handle for &mut H {
    fn tell(&mut self) -> io::Result<Option<u64>> {
        (**self).tell()
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        (**self).seek_to(offset)
    }
}

/// Hides the seek capability of the wrapped handle.
///
/// Useful for pipes wrapped in seekable types and for exercising the
/// forward-only and buffered code paths.
#[derive(Debug, Default)]
pub struct Unseekable<T>(pub T);

impl<T> Unseekable<T> {
    /// Wraps a handle.
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the wrapped handle.
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Borrows the wrapped handle.
    pub fn get_ref(&self) -> &T {
        &self.0
    }
}

impl<T: Read> Read for Unseekable<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<T: Write> Write for Unseekable<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<T> Handle for Unseekable<T> {
    fn tell(&mut self) -> io::Result<Option<u64>> {
        Ok(None)
    }

    fn seek_to(&mut self, _offset: u64) -> io::Result<()> {
        Err(not_seekable())
    }
}

/// Turns a finished output handle back into something a reader can parse.
pub trait Reopen: Sized {
    /// The readable handle produced.
    type Reader: Read + Handle;

    /// Positions the handle at its first byte for reading.
    fn reopen(self) -> io::Result<Self::Reader>;
}

impl Reopen for File {
    type Reader = File;

    /// The file must have been opened for both reading and writing.
    fn reopen(mut self) -> io::Result<File> {
        self.seek(SeekFrom::Start(0))?;
        Ok(self)
    }
}

impl Reopen for Cursor<Vec<u8>> {
    type Reader = Cursor<Vec<u8>>;

    fn reopen(mut self) -> io::Result<Self::Reader> {
        self.set_position(0);
        Ok(self)
    }
}

impl Reopen for Unseekable<Cursor<Vec<u8>>> {
    type Reader = Unseekable<Cursor<Vec<u8>>>;

    fn reopen(mut self) -> io::Result<Self::Reader> {
        self.0.set_position(0);
        Ok(self)
    }
}

/// Runs `read` with the cursor moved to `offset`, then puts the cursor back.
///
/// The saved offset is restored on every exit path, including when `read`
/// fails; a failure of `read` takes precedence over a failure to restore.
pub(crate) fn scoped_seek<H, T, F>(
    handle: &mut H,
    saved: u64,
    offset: u64,
    read: F,
) -> AudioResult<T>
where
    H: Handle,
    F: FnOnce(&mut H) -> AudioResult<T>,
{
    handle.seek_to(offset)?;
    let result = read(handle);
    let restored = handle.seek_to(saved);
    let value = result?;
    restored?;
    Ok(value)
}
