//! Entry payload resolution.

use chkn_common::BinaryReader;
use tracing::warn;

use crate::directory::DirectoryRecord;
use crate::{Error, Result};

/// A decoded file from the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// File name/path within the container.
    pub name: String,
    /// Decompressed contents.
    pub contents: Vec<u8>,
    /// Size the directory declared for the contents.
    pub declared_size: i32,
}

impl Entry {
    /// Check whether the contents have the size the directory declared.
    ///
    /// Resolution never enforces this; it is only a diagnostic.
    pub fn matches_declared_size(&self) -> bool {
        usize::try_from(self.declared_size).map_or(false, |size| size == self.contents.len())
    }
}

/// Locate the raw (possibly compressed) payload of a record.
///
/// The payload is a u32 length followed by that many bytes, found at the
/// record's absolute offset in the container.
pub fn payload_slice<'a>(container: &'a [u8], record: &DirectoryRecord) -> Result<&'a [u8]> {
    let offset = u32::try_from(record.payload_offset).map_err(|_| {
        Error::entry(
            &record.name,
            format!("negative payload offset {}", record.payload_offset),
        )
    })?;

    let mut reader = BinaryReader::new(container);
    reader
        .seek(offset as u64)
        .and_then(|()| reader.read_u32_prefixed())
        .map_err(|e| Error::entry(&record.name, e))
}

/// Resolve a record into its decompressed entry.
pub fn resolve_entry(container: &[u8], record: &DirectoryRecord) -> Result<Entry> {
    let raw = payload_slice(container, record)?;
    let contents = record
        .compression
        .decode(raw)
        .map_err(|e| e.in_region(format!("entry {:?}", record.name)))?
        .into_owned();

    let entry = Entry {
        name: record.name.clone(),
        contents,
        declared_size: record.uncompressed_size,
    };
    if !entry.matches_declared_size() {
        warn!(
            name = %entry.name,
            declared = entry.declared_size,
            actual = entry.contents.len(),
            "entry size differs from directory"
        );
    }

    Ok(entry)
}
