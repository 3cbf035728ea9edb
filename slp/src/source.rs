//! Uniform positional access over the places a replay can live.
//!
//! Every read names its own offset; nothing here moves a shared cursor, so a
//! single open handle can be read from several places at once.

use std::fs::File;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{Log, Result, SlpError};

/// What the caller hands us to read a replay from.
#[derive(Clone, Debug)]
pub enum SlpInput {
    File(PathBuf),
    Buffer(Arc<[u8]>),
}

impl From<PathBuf> for SlpInput {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<Vec<u8>> for SlpInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(bytes.into())
    }
}

/// An opened byte source. Dropping (or `close`-ing) a file source releases the
/// underlying handle.
#[derive(Debug)]
pub enum SourceRef {
    File(File),
    Buffer(Arc<[u8]>),
}

impl SourceRef {
    /// Opens `input` for reading.
    ///
    /// Paths that exist but aren't regular files (directories, sockets, etc)
    /// are rejected with `UnsupportedSourceKind`.
    pub fn open(input: &SlpInput) -> Result<Self> {
        match input {
            SlpInput::File(path) => {
                if !std::fs::metadata(path)?.is_file() {
                    return Err(SlpError::UnsupportedSourceKind(path.clone()));
                }

                let file = File::open(path)?;
                tracing::debug!(target: Log::SlpReader, ?path, "Opened replay file");

                Ok(Self::File(file))
            },

            SlpInput::Buffer(bytes) => Ok(Self::Buffer(Arc::clone(bytes))),
        }
    }

    /// Fills as much of `buffer` as the source has available starting at
    /// `offset`, returning how many bytes were written. Reading at or past the
    /// end of the source yields `0`.
    pub fn read_into(&self, buffer: &mut [u8], offset: u64) -> Result<usize> {
        match self {
            Self::File(file) => Ok(read_file_at(file, buffer, offset)?),

            Self::Buffer(bytes) => {
                let Ok(start) = usize::try_from(offset) else {
                    return Ok(0);
                };

                let Some(available) = bytes.get(start..) else {
                    return Ok(0);
                };

                let count = available.len().min(buffer.len());
                buffer[..count].copy_from_slice(&available[..count]);
                Ok(count)
            },
        }
    }

    /// Reads up to `length` bytes at `offset`. The returned vector is shorter
    /// than `length` when the source ends first.
    pub fn read(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0; length];
        let count = self.read_into(&mut bytes, offset)?;
        bytes.truncate(count);
        Ok(bytes)
    }

    /// Total size of the source in bytes.
    pub fn len(&self) -> Result<u64> {
        match self {
            Self::File(file) => Ok(file.metadata()?.len()),
            Self::Buffer(bytes) => Ok(bytes.len() as u64),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Releases the source. For buffers this is a no-op beyond dropping our
    /// reference count.
    pub fn close(self) {
        if let Self::File(_) = &self {
            tracing::debug!(target: Log::SlpReader, "Closing replay file");
        }
    }
}

fn read_file_at(file: &File, buffer: &mut [u8], offset: u64) -> std::io::Result<usize> {
    let mut filled = 0;

    while filled < buffer.len() {
        match positional_read(file, &mut buffer[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(count) => filled += count,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }

    Ok(filled)
}

#[cfg(unix)]
fn positional_read(file: &File, buffer: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buffer, offset)
}

#[cfg(windows)]
fn positional_read(file: &File, buffer: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buffer, offset)
}
