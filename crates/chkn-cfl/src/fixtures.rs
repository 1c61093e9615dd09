//! Synthetic containers for tests.
//!
//! Payloads are laid out right after the 8-byte header and the directory
//! prelude goes last, reached through the seek target. That way payload
//! offsets are known before the (possibly compressed) directory is built.

use byteorder::{LittleEndian, WriteBytesExt};
use lzma_rs::compress::{Options, UnpackedSize};

use crate::codec::PROPERTIES_SIZE;
use crate::compression::Compression;
use crate::header::HASHED_MAGIC;

/// Compress with the container convention: properties, then the stream.
///
/// The encoder only terminates the stream with an end marker when the
/// header carries the "unknown size" placeholder, so that placeholder is
/// written and then cut out again.
pub(crate) fn lzma_compress(data: &[u8]) -> Vec<u8> {
    let options = Options {
        unpacked_size: UnpackedSize::WriteToHeader(None),
    };
    let mut output = Vec::new();
    lzma_rs::lzma_compress_with_options(&mut &data[..], &mut output, &options).unwrap();
    output.drain(PROPERTIES_SIZE..PROPERTIES_SIZE + 8);
    output
}

struct FixtureEntry {
    name: String,
    contents: Vec<u8>,
    compression: i32,
    hash: Option<String>,
    offset: Option<i32>,
}

pub(crate) struct ContainerBuilder {
    magic: [u8; 4],
    padding: Vec<u8>,
    format: i32,
    entries: Vec<FixtureEntry>,
    trailer: Vec<u8>,
}

impl ContainerBuilder {
    pub(crate) fn new(magic: [u8; 4]) -> Self {
        Self {
            magic,
            padding: Vec::new(),
            format: 0,
            entries: Vec::new(),
            trailer: Vec::new(),
        }
    }

    pub(crate) fn hashed() -> Self {
        Self::new(HASHED_MAGIC)
    }

    /// Bytes between the payloads and the directory prelude.
    pub(crate) fn prelude_padding(mut self, padding: &[u8]) -> Self {
        self.padding = padding.to_vec();
        self
    }

    pub(crate) fn lzma_directory(mut self) -> Self {
        self.format = Compression::LZMA_ID;
        self
    }

    /// Bytes appended to the directory blob before it is compressed.
    pub(crate) fn directory_trailer(mut self, trailer: &[u8]) -> Self {
        self.trailer = trailer.to_vec();
        self
    }

    fn push(mut self, name: &str, contents: &[u8], compression: i32, hash: Option<&str>) -> Self {
        self.entries.push(FixtureEntry {
            name: name.to_string(),
            contents: contents.to_vec(),
            compression,
            hash: hash.map(str::to_string),
            offset: None,
        });
        self
    }

    pub(crate) fn entry(self, name: &str, contents: &[u8]) -> Self {
        self.push(name, contents, 0, None)
    }

    pub(crate) fn lzma_entry(self, name: &str, contents: &[u8]) -> Self {
        self.push(name, contents, Compression::LZMA_ID, None)
    }

    pub(crate) fn hashed_entry(self, name: &str, contents: &[u8], hash: &str) -> Self {
        self.push(name, contents, 0, Some(hash))
    }

    pub(crate) fn lzma_hashed_entry(self, name: &str, contents: &[u8], hash: &str) -> Self {
        self.push(name, contents, Compression::LZMA_ID, Some(hash))
    }

    /// A stored entry whose record points at `offset` instead of its payload.
    pub(crate) fn entry_at(self, name: &str, contents: &[u8], offset: i32) -> Self {
        let mut builder = self.push(name, contents, 0, None);
        if let Some(entry) = builder.entries.last_mut() {
            entry.offset = Some(offset);
        }
        builder
    }

    fn payloads(&self) -> (Vec<u8>, Vec<i32>) {
        let mut out = Vec::new();
        let mut offsets = Vec::new();
        for entry in &self.entries {
            offsets.push(8 + out.len() as i32);
            let payload = if entry.compression == Compression::LZMA_ID {
                lzma_compress(&entry.contents)
            } else {
                entry.contents.clone()
            };
            out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            out.extend_from_slice(&payload);
        }
        (out, offsets)
    }

    fn encode_directory(&self, offsets: &[i32]) -> Vec<u8> {
        let hashed = self.magic == HASHED_MAGIC;
        let mut out = Vec::new();
        for (entry, offset) in self.entries.iter().zip(offsets) {
            out.write_i32::<LittleEndian>(entry.contents.len() as i32).unwrap();
            out.write_i32::<LittleEndian>(entry.offset.unwrap_or(*offset)).unwrap();
            out.write_i32::<LittleEndian>(entry.compression).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.extend_from_slice(entry.name.as_bytes());
            if hashed {
                let hash = entry.hash.as_deref().unwrap_or("");
                out.write_i32::<LittleEndian>(hash.len() as i32).unwrap();
                out.extend_from_slice(hash.as_bytes());
            }
        }
        out.extend_from_slice(&self.trailer);
        out
    }

    /// The uncompressed directory blob.
    pub(crate) fn directory_blob(&self) -> Vec<u8> {
        let (_, offsets) = self.payloads();
        self.encode_directory(&offsets)
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let (payloads, offsets) = self.payloads();
        let mut directory = self.encode_directory(&offsets);
        if self.format == Compression::LZMA_ID {
            directory = lzma_compress(&directory);
        }

        let prelude_offset = 8 + payloads.len() + self.padding.len();

        let mut out = Vec::new();
        out.extend_from_slice(&self.magic);
        out.write_u32::<LittleEndian>(prelude_offset as u32).unwrap();
        out.extend_from_slice(&payloads);
        out.extend_from_slice(&self.padding);
        out.write_i32::<LittleEndian>(self.format).unwrap();
        out.write_i32::<LittleEndian>(directory.len() as i32).unwrap();
        out.extend_from_slice(&directory);
        out
    }
}
