//! Frame-by-frame processing of named input streams into one output.
//!
//! A [`Session`] owns a set of named [`WavReader`]s. [`Session::process`] opens
//! a writer on the output handle and calls the combinator once per step with
//! the inputs and the step number; each returned frame is appended until the
//! combinator returns [`Sample::Eof`]. The finished output is reopened as a
//! reader so it can feed the next session.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::Cursor;
//! use wavproc::{Sample, Session, WavReader};
//!
//! let voice = WavReader::open(File::open("voice.wav")?)?;
//! let mut session = Session::new().with_input("voice", voice);
//!
//! // Halve the volume of every frame.
//! let quieter = session.process(Cursor::new(Vec::new()), |inputs, _step| {
//!     let next = inputs.get_mut("voice")?.get_next(1)?;
//!     Ok(match next.into_iter().next() {
//!         Some(Sample::Frame(frame)) => Sample::Frame(frame.iter().map(|v| v / 2).collect()),
//!         _ => Sample::Eof,
//!     })
//! })?;
//!
//! assert_eq!(quieter.channels(), 2);
//! # Ok::<(), wavproc::AudioError>(())
//! ```

use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::error::{AudioError, AudioResult};
use crate::handle::{Handle, Reopen};
use crate::wav::{Sample, WavReader, WavWriter};

/// Named input streams available to a combinator.
#[derive(Debug)]
pub struct Inputs<R> {
    streams: BTreeMap<String, WavReader<R>>,
}

impl<R> Default for Inputs<R> {
    fn default() -> Self {
        Self {
            streams: BTreeMap::new(),
        }
    }
}

impl<R> Inputs<R> {
    /// Looks up an input for reading.
    pub fn get_mut(&mut self, name: &str) -> AudioResult<&mut WavReader<R>> {
        self.streams
            .get_mut(name)
            .ok_or_else(|| AudioError::UnknownInput {
                name: name.to_string(),
            })
    }

    /// Borrows an input, if registered.
    pub fn get(&self, name: &str) -> Option<&WavReader<R>> {
        self.streams.get(name)
    }

    /// Returns true if an input with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }

    /// Names of all registered inputs, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    /// Iterates over all inputs mutably, in name order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut WavReader<R>)> {
        self.streams
            .iter_mut()
            .map(|(name, reader)| (name.as_str(), reader))
    }

    /// Number of registered inputs.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Returns true if no inputs are registered.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    fn insert(&mut self, name: String, reader: WavReader<R>) -> Option<WavReader<R>> {
        self.streams.insert(name, reader)
    }

    /// Removes an input and returns it.
    pub fn remove(&mut self, name: &str) -> Option<WavReader<R>> {
        self.streams.remove(name)
    }
}

/// A set of named inputs that can be processed into an output stream.
#[derive(Debug)]
pub struct Session<R> {
    inputs: Inputs<R>,
}

impl<R> Default for Session<R> {
    fn default() -> Self {
        Self {
            inputs: Inputs::default(),
        }
    }
}

impl<R> Session<R> {
    /// Creates a session without inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session with a single input, typically the output of a
    /// previous [`Session::process`].
    pub fn from_reader(name: impl Into<String>, reader: WavReader<R>) -> Self {
        Self::new().with_input(name, reader)
    }

    /// Returns this session extended with another input.
    ///
    /// An existing input of the same name is replaced.
    pub fn with_input(mut self, name: impl Into<String>, reader: WavReader<R>) -> Self {
        self.add_input(name, reader);
        self
    }

    /// Registers an input in place.
    ///
    /// An existing input of the same name is replaced and released.
    pub fn add_input(&mut self, name: impl Into<String>, reader: WavReader<R>) -> &mut Self {
        let name = name.into();
        if self.inputs.insert(name.clone(), reader).is_some() {
            tracing::debug!(input = %name, "replaced input stream");
        }
        self
    }

    /// The registered inputs.
    pub fn inputs(&self) -> &Inputs<R> {
        &self.inputs
    }

    /// The registered inputs, for reading outside of a processing run.
    pub fn inputs_mut(&mut self) -> &mut Inputs<R> {
        &mut self.inputs
    }

    /// Releases the session and returns its inputs.
    pub fn into_inputs(self) -> Inputs<R> {
        self.inputs
    }
}

impl<R: Read + Handle> Session<R> {
    /// Runs `combinator` over the inputs until it returns [`Sample::Eof`].
    ///
    /// See [`process`] for details.
    pub fn process<O, F>(
        &mut self,
        output: O,
        combinator: F,
    ) -> AudioResult<WavReader<O::Reader>>
    where
        O: Write + Handle + Reopen,
        F: FnMut(&mut Inputs<R>, u64) -> AudioResult<Sample>,
    {
        process(&mut self.inputs, output, combinator)
    }
}

/// Writes the frames produced by `combinator` to `output`.
///
/// The combinator is called with the inputs and a step counter starting at 0
/// that increases by one for every appended frame. Processing stops at the
/// first [`Sample::Eof`]; the output is then finalized and reopened as a reader
/// positioned at its first frame. Errors from the combinator or the output
/// abort processing immediately and leave the output unfinalized.
pub fn process<R, O, F>(
    inputs: &mut Inputs<R>,
    output: O,
    mut combinator: F,
) -> AudioResult<WavReader<O::Reader>>
where
    R: Read + Handle,
    O: Write + Handle + Reopen,
    F: FnMut(&mut Inputs<R>, u64) -> AudioResult<Sample>,
{
    let mut writer = WavWriter::create(output)?;
    tracing::debug!(
        inputs = inputs.len(),
        buffered = !writer.is_seekable(),
        "processing session started"
    );

    let mut step: u64 = 0;
    while let Sample::Frame(frame) = combinator(inputs, step)? {
        writer.append(&frame)?;
        step += 1;
    }

    let (handle, summary) = writer.finalize()?;
    tracing::debug!(
        steps = step,
        pcm_hash = %summary.pcm_hash,
        "processing session finished"
    );

    WavReader::open(handle.reopen()?)
}
