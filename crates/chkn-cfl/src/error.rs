//! Error types for the CFL crate.

use thiserror::Error;

/// Errors that can occur when decoding a CFL container.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while opening a container file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The magic, seek target or directory length could not be honored.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// A directory record reads past the directory blob or cannot terminate.
    #[error("malformed directory record #{index}: {reason}")]
    MalformedDirectory { index: usize, reason: String },

    /// An entry's payload offset or length reads past the container.
    #[error("malformed entry {name:?}: {reason}")]
    MalformedEntry { name: String, reason: String },

    /// The LZMA decoder rejected a compressed region.
    #[error("LZMA decode of {region} failed: {reason}")]
    Codec { region: String, reason: String },
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    MalformedHeader,
    MalformedDirectory,
    MalformedEntry,
    CodecFailure,
}

impl Error {
    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::MalformedHeader(_) => ErrorKind::MalformedHeader,
            Error::MalformedDirectory { .. } => ErrorKind::MalformedDirectory,
            Error::MalformedEntry { .. } => ErrorKind::MalformedEntry,
            Error::Codec { .. } => ErrorKind::CodecFailure,
        }
    }

    pub(crate) fn header(reason: impl ToString) -> Self {
        Error::MalformedHeader(reason.to_string())
    }

    pub(crate) fn directory(index: usize, reason: impl ToString) -> Self {
        Error::MalformedDirectory {
            index,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn entry(name: &str, reason: impl ToString) -> Self {
        Error::MalformedEntry {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Attach the region being decoded to a codec failure.
    pub(crate) fn in_region(self, region: impl Into<String>) -> Self {
        match self {
            Error::Codec { reason, .. } => Error::Codec {
                region: region.into(),
                reason,
            },
            other => other,
        }
    }
}

/// Result type for CFL operations.
pub type Result<T> = std::result::Result<T, Error>;
