//! Container header.
//!
//! ```text
//! magic            4 bytes   "DFL3" marks a hashed directory
//! seek target      u32       absolute offset of the directory prelude
//! ...                        container-specific bytes, skipped
//! format           i32       directory compression id
//! directory length i32       byte length of the directory blob
//! directory blob
//! ```

use chkn_common::BinaryReader;
use tracing::debug;
use zerocopy::little_endian::I32;
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::compression::Compression;
use crate::{Error, Result};

/// Magic of containers whose directory records carry a hash field.
pub const HASHED_MAGIC: [u8; 4] = *b"DFL3";

/// The two fields found at the seek target.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct DirectoryPrelude {
    format: I32,
    length: I32,
}

/// Decoded container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// The first four bytes of the container.
    pub magic: [u8; 4],
    /// Absolute offset the directory prelude was read from.
    pub directory_offset: u32,
    /// Compression of the directory blob.
    pub format: Compression,
    /// Byte length of the (possibly compressed) directory blob.
    pub directory_length: u32,
}

impl ContainerHeader {
    /// Whether directory records carry a hash field.
    #[inline]
    pub fn is_hashed(&self) -> bool {
        self.magic == HASHED_MAGIC
    }

    /// Get the magic as text, replacing invalid UTF-8.
    pub fn magic_str(&self) -> String {
        String::from_utf8_lossy(&self.magic).into_owned()
    }

    /// Read the header and return it with the raw directory blob.
    ///
    /// Unknown magics are accepted and simply mean "not hashed".
    pub fn read(container: &[u8]) -> Result<(Self, &[u8])> {
        let mut reader = BinaryReader::new(container);

        let magic: [u8; 4] = reader
            .read_array()
            .map_err(|e| Error::header(format!("magic: {e}")))?;
        let directory_offset = reader
            .read_u32()
            .map_err(|e| Error::header(format!("seek target: {e}")))?;
        reader
            .seek(directory_offset as u64)
            .map_err(Error::header)?;

        let prelude: DirectoryPrelude = reader
            .read_struct()
            .map_err(|e| Error::header(format!("directory prelude: {e}")))?;
        let format = Compression::from(prelude.format.get());
        let length = prelude.length.get();
        let directory_length = u32::try_from(length)
            .map_err(|_| Error::header(format!("negative directory length {length}")))?;

        let directory = reader.read_bytes(directory_length as usize).map_err(|_| {
            Error::header(format!(
                "directory length {directory_length} exceeds the {} bytes left in the container",
                reader.remaining()
            ))
        })?;

        let header = Self {
            magic,
            directory_offset,
            format,
            directory_length,
        };
        debug!(
            magic = %header.magic_str(),
            hashed = header.is_hashed(),
            directory_offset,
            format = %format,
            directory_length,
            "decoded CFL header"
        );

        Ok((header, directory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ContainerBuilder;
    use crate::ErrorKind;

    #[test]
    fn test_hashed_magic() {
        let data = ContainerBuilder::hashed().build();
        let (header, directory) = ContainerHeader::read(&data).unwrap();

        assert!(header.is_hashed());
        assert_eq!(header.magic_str(), "DFL3");
        assert_eq!(header.format, Compression::Stored(0));
        assert!(directory.is_empty());
    }

    #[test]
    fn test_unknown_magic_is_unhashed() {
        let data = ContainerBuilder::new(*b"PLN0").build();
        let (header, _) = ContainerHeader::read(&data).unwrap();

        assert!(!header.is_hashed());
    }

    #[test]
    fn test_seek_skips_padding() {
        let data = ContainerBuilder::new(*b"CFL3")
            .prelude_padding(b"padding!")
            .entry("a.txt", b"abc")
            .build();
        let (header, directory) = ContainerHeader::read(&data).unwrap();

        // header(8) + payload(4 + 3) + padding(8)
        assert_eq!(header.directory_offset, 23);
        assert_eq!(directory.len() as u32, header.directory_length);
    }

    #[test]
    fn test_truncated_magic() {
        let err = ContainerHeader::read(b"DF").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedHeader);
    }

    #[test]
    fn test_seek_target_out_of_bounds() {
        let mut data = b"DFL3".to_vec();
        data.extend_from_slice(&1000u32.to_le_bytes());

        let err = ContainerHeader::read(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedHeader);
    }

    #[test]
    fn test_negative_directory_length() {
        let mut data = b"DFL3".to_vec();
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&(-1i32).to_le_bytes());

        let err = ContainerHeader::read(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedHeader);
    }

    #[test]
    fn test_directory_length_overflow() {
        let mut data = b"PLN0".to_vec();
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&64i32.to_le_bytes());
        data.extend_from_slice(&[0u8; 10]);

        let err = ContainerHeader::read(&data).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(ref msg) if msg.contains("64")));
    }
}
