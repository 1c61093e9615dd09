//! chkn - convert CFL product containers into CHKN archives.
//!
//! This crate ties the decoder crates to the outside world: it writes decoded
//! entries into ZIP-based CHKN files and downloads published products.
//!
//! # Crates
//!
//! - [`chkn_common`] - Bounds-checked binary reading
//! - [`chkn_cfl`] - CFL container decoding (header, directory, LZMA payloads)
//!
//! # Example
//!
//! ```no_run
//! use chkn::prelude::*;
//!
//! let container = std::fs::read("product.cfl")?;
//! let chkn = convert_to_chkn(&container, ChknOptions::default())?;
//! std::fs::write("product.chkn", chkn)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod product;
pub mod writer;

// Re-export sub-crates
pub use chkn_cfl as cfl;
pub use chkn_common as common;

pub use error::{Error, Result};
pub use product::{ProductFetcher, DEFAULT_BASE_URL};
pub use writer::{convert_to_chkn, entries_to_chkn, write_chkn, ChknOptions};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::product::ProductFetcher;
    pub use crate::writer::{convert_to_chkn, entries_to_chkn, write_chkn, ChknOptions};
    pub use chkn_cfl::{convert, CflArchive, Compression, DirectoryRecord, Entry, RecordHash};
    pub use chkn_common::BinaryReader;
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
