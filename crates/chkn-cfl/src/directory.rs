//! Directory records.
//!
//! The directory blob is a plain concatenation of records:
//!
//! ```text
//! uncompressed size  i32
//! payload offset     i32   absolute, into the container
//! compression        i32
//! name length        u16
//! name               UTF-8
//! hash length        i32   hashed containers only
//! hash               UTF-8 hashed containers only
//! ```
//!
//! The blob has no record count. Iteration is driven by a running sum of
//! each record's *accounted* length (see [`DirectoryRecord::record_length`]),
//! which is computed rather than read and undercounts records with a blank
//! hash. The sum is kept separate from the read cursor, so a blank hash
//! leaves the sum short of the blob length once every byte has been read;
//! the next record read then fails as [`Error::MalformedDirectory`].

use chkn_common::BinaryReader;
use tracing::debug;
use zerocopy::little_endian::{I32, U16};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::compression::Compression;
use crate::header::ContainerHeader;
use crate::{Error, Result};

/// Fixed-size start of every record.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RecordPrefix {
    uncompressed_size: I32,
    payload_offset: I32,
    compression: I32,
    name_length: U16,
}

/// Accounted length of a record before its name.
pub const RECORD_BASE_LENGTH: usize = std::mem::size_of::<RecordPrefix>();

/// Size of the hash length field.
const HASH_LENGTH_SIZE: usize = 4;

/// Hash field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordHash {
    /// The container is not hashed; the field is absent from the stream.
    Unhashed,
    /// The field is present, possibly empty or whitespace.
    Hashed(String),
}

impl RecordHash {
    /// Get the hash text, if the field is present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RecordHash::Unhashed => None,
            RecordHash::Hashed(hash) => Some(hash),
        }
    }

    /// Check if the field is present but empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        match self {
            RecordHash::Unhashed => false,
            RecordHash::Hashed(hash) => hash.trim().is_empty(),
        }
    }

    /// Check if the field is present and not blank.
    ///
    /// Only such hashes count towards a record's accounted length.
    pub fn has_value(&self) -> bool {
        match self {
            RecordHash::Unhashed => false,
            RecordHash::Hashed(_) => !self.is_blank(),
        }
    }
}

/// One entry descriptor from the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    /// Declared size of the decompressed contents (not verified).
    pub uncompressed_size: i32,
    /// Absolute offset of the payload in the container.
    pub payload_offset: i32,
    /// Compression of the payload.
    pub compression: Compression,
    /// Entry name.
    pub name: String,
    /// Hash field.
    pub hash: RecordHash,
    record_length: usize,
}

impl DirectoryRecord {
    /// Create a record, computing its accounted length from `name` and `hash`.
    pub fn new(
        uncompressed_size: i32,
        payload_offset: i32,
        compression: Compression,
        name: impl Into<String>,
        hash: RecordHash,
    ) -> Self {
        let name = name.into();
        let hash_len = hash.as_str().map_or(0, str::len);
        let record_length = accounted_length(name.len(), &hash, hash_len);
        Self {
            uncompressed_size,
            payload_offset,
            compression,
            name,
            hash,
            record_length,
        }
    }

    /// Accounted length of this record in the directory.
    ///
    /// This is `14 + name bytes`, plus `4 + hash bytes` when the hash is
    /// present and not blank. A blank hash still occupies its length field
    /// and bytes in the stream, so for such records this is smaller than the
    /// number of bytes actually consumed.
    #[inline]
    pub fn record_length(&self) -> usize {
        self.record_length
    }

    /// Decode one record at the reader's position.
    pub fn read(reader: &mut BinaryReader<'_>, hashed: bool) -> chkn_common::Result<Self> {
        let prefix: RecordPrefix = reader.read_struct()?;
        let name_bytes = reader.read_bytes(prefix.name_length.get() as usize)?;
        let name = String::from_utf8_lossy(name_bytes).into_owned();

        let (hash, hash_len) = if hashed {
            let hash_bytes = reader.read_i32_prefixed()?;
            (
                RecordHash::Hashed(String::from_utf8_lossy(hash_bytes).into_owned()),
                hash_bytes.len(),
            )
        } else {
            (RecordHash::Unhashed, 0)
        };

        // Lengths come from the raw bytes so lossy decoding cannot skew them
        let record_length = accounted_length(name_bytes.len(), &hash, hash_len);

        Ok(Self {
            uncompressed_size: prefix.uncompressed_size.get(),
            payload_offset: prefix.payload_offset.get(),
            compression: Compression::from(prefix.compression.get()),
            name,
            hash,
            record_length,
        })
    }
}

fn accounted_length(name_len: usize, hash: &RecordHash, hash_len: usize) -> usize {
    let hash_part = if hash.has_value() {
        HASH_LENGTH_SIZE + hash_len
    } else {
        0
    };
    RECORD_BASE_LENGTH + name_len + hash_part
}

/// A decoded container directory.
#[derive(Debug, Clone)]
pub struct Directory {
    /// The container header the directory was located through.
    pub header: ContainerHeader,
    /// Records in directory order.
    pub records: Vec<DirectoryRecord>,
}

impl Directory {
    /// Whether records carry a hash field.
    #[inline]
    pub fn is_hashed(&self) -> bool {
        self.header.is_hashed()
    }
}

/// Parse the header and every directory record of a container.
pub fn parse_directory(container: &[u8]) -> Result<Directory> {
    let (header, raw) = ContainerHeader::read(container)?;

    let directory = header
        .format
        .decode(raw)
        .map_err(|e| e.in_region("directory"))?;
    if header.format.is_lzma() {
        debug!(
            compressed = raw.len(),
            decompressed = directory.len(),
            "decompressed CFL directory"
        );
    }

    let records = decode_records(&directory, header.is_hashed())?;
    debug!(
        "parsed {} CFL {}",
        records.len(),
        if records.len() == 1 { "entry" } else { "entries" }
    );

    Ok(Directory { header, records })
}

/// Decode records from a (decompressed) directory blob.
///
/// Decoding continues while the accounted length is below the blob length.
pub fn decode_records(directory: &[u8], hashed: bool) -> Result<Vec<DirectoryRecord>> {
    let mut reader = BinaryReader::new(directory);
    let mut accounted = 0usize;
    let mut records = Vec::new();

    while accounted < directory.len() {
        let index = records.len();
        let record =
            DirectoryRecord::read(&mut reader, hashed).map_err(|e| Error::directory(index, e))?;

        // Unreachable with a 14-byte base, but a stalled cursor would spin forever
        if record.record_length() == 0 {
            return Err(Error::directory(index, "record length is zero"));
        }

        accounted += record.record_length();
        records.push(record);
    }

    Ok(records)
}
