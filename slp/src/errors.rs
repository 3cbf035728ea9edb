use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlpError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("The provided path is not a readable replay source: {0:?}")]
    UnsupportedSourceKind(PathBuf),

    #[error("Failed to decode UBJSON at offset {offset}: {reason}")]
    Ubjson { offset: usize, reason: String },
}

impl SlpError {
    pub(crate) fn ubjson(offset: usize, reason: impl Into<String>) -> Self {
        Self::Ubjson {
            offset,
            reason: reason.into(),
        }
    }
}
