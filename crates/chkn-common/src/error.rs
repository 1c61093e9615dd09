//! Error types for chkn-common.

use thiserror::Error;

/// Error raised by [`BinaryReader`](crate::BinaryReader).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A read needed more bytes than the buffer holds past the cursor.
    #[error("unexpected end of buffer at offset {offset}: needed {needed} bytes but only {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A seek pointed past the end of the buffer.
    #[error("seek to offset {target} is outside a buffer of {len} bytes")]
    SeekOutOfBounds { target: u64, len: usize },

    /// A length prefix was negative.
    #[error("negative length prefix {0}")]
    NegativeLength(i64),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
