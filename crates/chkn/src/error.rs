//! Error types for chkn.

use thiserror::Error;

/// Errors that can occur while producing CHKN archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CFL container could not be decoded.
    #[error("{0}")]
    Cfl(#[from] chkn_cfl::Error),

    /// The ZIP writer failed.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A product manifest was not valid JSON.
    #[error("invalid product manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// Transient failures persisted past the retry budget.
    #[error("giving up on {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },
}

/// Result type for chkn operations.
pub type Result<T> = std::result::Result<T, Error>;
