//! CFL product container decoder.
//!
//! A CFL container bundles the files of one product. It consists of a small
//! header, a directory blob (optionally LZMA-compressed) describing every
//! entry, and the entry payloads at absolute offsets (each optionally
//! LZMA-compressed). Containers starting with the `DFL3` magic carry an extra
//! hash field in every directory record.
//!
//! Decoding happens in two stages that share nothing but the read-only
//! container bytes:
//!
//! 1. [`parse_directory`] reads the header, follows its seek target, decodes
//!    the directory blob and returns the records in order.
//! 2. [`resolve_entry`] turns one record into an [`Entry`] by slicing and
//!    decompressing its payload. Records are independent, so this can run
//!    in parallel (with the `parallel` feature).
//!
//! [`convert`] composes both and is all-or-nothing.
//!
//! # Example
//!
//! ```no_run
//! use chkn_cfl::CflArchive;
//!
//! let archive = CflArchive::open("product.cfl")?;
//!
//! for record in archive.records() {
//!     println!("{}: {} bytes ({})", record.name, record.uncompressed_size, record.compression);
//! }
//!
//! let entries = archive.resolve_all()?;
//! # Ok::<(), chkn_cfl::Error>(())
//! ```

mod archive;
mod codec;
mod compression;
mod directory;
mod entry;
mod error;
mod header;

#[cfg(test)]
mod fixtures;

pub use archive::{convert, CflArchive};
pub use codec::{decompress_lzma, PROPERTIES_SIZE};
pub use compression::Compression;
pub use directory::{
    decode_records, parse_directory, Directory, DirectoryRecord, RecordHash, RECORD_BASE_LENGTH,
};
pub use entry::{payload_slice, resolve_entry, Entry};
pub use error::{Error, ErrorKind, Result};
pub use header::{ContainerHeader, HASHED_MAGIC};
