//! Byte sources for configuration documents.
//!
//! Responsibilities:
//! - Define the `Source` capability: produce a readable byte stream or fail.
//! - Provide built-in sources for filesystem paths and in-memory or
//!   embedded bytes.
//! - Read a source to completion with the stream released on every path.
//!
//! Does NOT handle:
//! - YAML decoding or merging (see `merge` and `loader`).
//! - Deciding whether a missing source is an error (layer policy lives in
//!   `loader`).
//!
//! Invariants:
//! - A stream opened by `read_all` is dropped before the function returns,
//!   on success and on failure.
//! - `describe()` output is stable and safe to embed in error messages.

use std::borrow::Cow;
use std::io::{self, Read};
use std::path::PathBuf;

use crate::error::{ConfigError, Layer};

/// A producer of configuration document bytes.
///
/// Each call to `open` yields a fresh stream; the caller owns the stream
/// and drops it when done. Anything satisfying this single-method contract
/// can feed the loader, including closures:
///
/// ```
/// use std::io::{self, Read};
/// use layercfg::Source;
///
/// let source = || -> io::Result<Box<dyn Read>> {
///     Ok(Box::new(io::Cursor::new("port: 9090\n")))
/// };
/// assert!(source.open().is_ok());
/// ```
pub trait Source {
    /// Open a fresh byte stream over this source's contents.
    fn open(&self) -> io::Result<Box<dyn Read + '_>>;

    /// A human-readable identity for error messages (a path, a logical
    /// name, or a placeholder for dynamic sources).
    fn describe(&self) -> String;
}

impl<F> Source for F
where
    F: Fn() -> io::Result<Box<dyn Read>>,
{
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        (self)()
    }

    fn describe(&self) -> String {
        "<dynamic source>".to_string()
    }
}

/// A source backed by a filesystem path, opened on each load.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Source for FileSource {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(std::fs::File::open(&self.path)?))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A source backed by bytes already in memory.
///
/// Covers both ad-hoc buffers (`BytesSource::new`) and resources compiled
/// into the binary (`BytesSource::embedded` with `include_bytes!`). The
/// logical name appears in error messages in place of a path.
#[derive(Debug, Clone)]
pub struct BytesSource {
    name: String,
    bytes: Cow<'static, [u8]>,
}

impl BytesSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: Cow::Owned(bytes.into()),
        }
    }

    /// Wrap bytes embedded in the binary, e.g. `include_bytes!("base.yaml")`.
    pub fn embedded(name: impl Into<String>, bytes: &'static [u8]) -> Self {
        Self {
            name: name.into(),
            bytes: Cow::Borrowed(bytes),
        }
    }
}

impl Source for BytesSource {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(io::Cursor::new(self.bytes.as_ref())))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Open a source and read it to completion for the given layer.
///
/// The stream lives only inside this function; dropping it on every exit
/// path is what guarantees no stream outlives a load call.
pub(crate) fn read_all(source: &dyn Source, layer: Layer) -> Result<Vec<u8>, ConfigError> {
    let mut reader = source.open().map_err(|e| ConfigError::SourceOpen {
        layer,
        name: source.describe(),
        source: e,
    })?;

    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .map_err(|e| ConfigError::SourceRead {
            layer,
            name: source.describe(),
            source: e,
        })?;

    Ok(buf)
}
