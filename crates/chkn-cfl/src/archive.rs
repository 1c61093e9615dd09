//! CFL archive handle.

use std::fs::File;
use std::ops::{ControlFlow, Deref};
use std::path::Path;

use memmap2::Mmap;

use crate::directory::{parse_directory, Directory, DirectoryRecord};
use crate::entry::{payload_slice, resolve_entry, Entry};
use crate::header::ContainerHeader;
use crate::Result;

/// Decode every entry of a container, in directory order.
///
/// This is all-or-nothing: the first malformed record or payload aborts the
/// conversion. Duplicate names are kept as separate entries.
pub fn convert(container: &[u8]) -> Result<Vec<Entry>> {
    let directory = parse_directory(container)?;
    directory
        .records
        .iter()
        .map(|record| resolve_entry(container, record))
        .collect()
}

/// Bytes backing an archive.
enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Backing::Mapped(mmap) => mmap,
            Backing::Owned(data) => data,
        }
    }
}

/// A CFL container with its directory already parsed.
///
/// Entry contents are only decompressed when asked for.
pub struct CflArchive {
    /// Container bytes
    data: Backing,
    /// Archive file name
    name: String,
    /// Header and records
    directory: Directory,
}

impl CflArchive {
    /// Open and memory-map a CFL file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self::from_backing(name, Backing::Mapped(mmap))
    }

    /// Parse a container that is already in memory.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        Self::from_backing(name.into(), Backing::Owned(data))
    }

    fn from_backing(name: String, data: Backing) -> Result<Self> {
        let directory = parse_directory(&data)?;
        Ok(Self {
            data,
            name,
            directory,
        })
    }

    /// Get the archive name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the raw container bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the container header.
    #[inline]
    pub fn header(&self) -> &ContainerHeader {
        &self.directory.header
    }

    /// Whether records carry a hash field.
    #[inline]
    pub fn is_hashed(&self) -> bool {
        self.directory.is_hashed()
    }

    /// Get the number of entries.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.directory.records.len()
    }

    /// Get all records in directory order.
    #[inline]
    pub fn records(&self) -> &[DirectoryRecord] {
        &self.directory.records
    }

    /// Get a record by index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&DirectoryRecord> {
        self.directory.records.get(index)
    }

    /// Find the first record with the given name.
    pub fn find(&self, name: &str) -> Option<&DirectoryRecord> {
        self.directory.records.iter().find(|r| r.name == name)
    }

    /// Get the raw, still compressed payload of a record.
    pub fn raw_payload(&self, record: &DirectoryRecord) -> Result<&[u8]> {
        payload_slice(&self.data, record)
    }

    /// Read and decompress the contents of a record.
    pub fn read(&self, record: &DirectoryRecord) -> Result<Vec<u8>> {
        self.resolve(record).map(|entry| entry.contents)
    }

    /// Resolve a record into an entry.
    #[inline]
    pub fn resolve(&self, record: &DirectoryRecord) -> Result<Entry> {
        resolve_entry(&self.data, record)
    }

    /// Resolve every record in directory order.
    pub fn resolve_all(&self) -> Result<Vec<Entry>> {
        self.directory
            .records
            .iter()
            .map(|record| self.resolve(record))
            .collect()
    }

    /// Resolve records one at a time, handing each entry to `visit`.
    ///
    /// Returning [`ControlFlow::Break`] stops before the next record is
    /// touched. Returns the number of entries visited.
    pub fn resolve_each<F>(&self, mut visit: F) -> Result<usize>
    where
        F: FnMut(Entry) -> ControlFlow<()>,
    {
        let mut visited = 0;
        for record in &self.directory.records {
            let entry = self.resolve(record)?;
            visited += 1;
            if visit(entry).is_break() {
                break;
            }
        }
        Ok(visited)
    }

    /// Resolve every record in parallel, keeping directory order.
    #[cfg(feature = "parallel")]
    pub fn resolve_parallel(&self) -> Result<Vec<Entry>> {
        self.resolve_parallel_with(|_| {})
    }

    /// Parallel resolution with a callback run after each entry.
    ///
    /// The callback receives the index of the record that just finished and
    /// may be called from any worker thread.
    #[cfg(feature = "parallel")]
    pub fn resolve_parallel_with<F>(&self, on_resolved: F) -> Result<Vec<Entry>>
    where
        F: Fn(usize) + Sync,
    {
        use rayon::prelude::*;

        self.directory
            .records
            .par_iter()
            .enumerate()
            .map(|(index, record)| {
                self.resolve(record).map(|entry| {
                    on_resolved(index);
                    entry
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for CflArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CflArchive")
            .field("name", &self.name)
            .field("hashed", &self.is_hashed())
            .field("entries", &self.directory.records.len())
            .finish()
    }
}
