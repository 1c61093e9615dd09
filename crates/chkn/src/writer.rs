//! CHKN (ZIP) output.
//!
//! A CHKN file is an ordinary ZIP archive holding the product's files. ZIP
//! names must be unique, so when a name repeats the last file with that name
//! is written and the earlier ones are dropped, which is what overwriting
//! the same path would do.

use std::collections::HashMap;
use std::io::{Cursor, Seek, Write};

use chkn_cfl::Entry;
use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::Result;

/// How files are stored in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChknOptions {
    /// Deflate file contents instead of storing them.
    pub deflate: bool,
}

impl ChknOptions {
    fn file_options(&self) -> SimpleFileOptions {
        let method = if self.deflate {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        SimpleFileOptions::default().compression_method(method)
    }
}

/// Write `(name, contents)` pairs into a ZIP archive.
///
/// Returns the inner writer after the central directory has been written.
pub fn write_chkn<'a, W, I>(files: I, writer: W, options: ChknOptions) -> Result<W>
where
    W: Write + Seek,
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let files: Vec<_> = files.into_iter().collect();

    let mut last_index = HashMap::with_capacity(files.len());
    for (index, (name, _)) in files.iter().enumerate() {
        last_index.insert(*name, index);
    }

    let file_options = options.file_options();
    let mut zip = ZipWriter::new(writer);

    for (index, (name, contents)) in files.iter().enumerate() {
        if last_index[name] != index {
            warn!(name = %name, "duplicate entry name, keeping the later file");
            continue;
        }
        zip.start_file(*name, file_options)?;
        zip.write_all(contents)?;
    }

    Ok(zip.finish()?)
}

/// Write decoded entries into an in-memory CHKN archive.
pub fn entries_to_chkn(entries: &[Entry], options: ChknOptions) -> Result<Vec<u8>> {
    let files = entries
        .iter()
        .map(|entry| (entry.name.as_str(), entry.contents.as_slice()));
    let cursor = write_chkn(files, Cursor::new(Vec::new()), options)?;
    Ok(cursor.into_inner())
}

/// Convert a CFL container straight into CHKN bytes.
pub fn convert_to_chkn(container: &[u8], options: ChknOptions) -> Result<Vec<u8>> {
    let entries = chkn_cfl::convert(container)?;
    entries_to_chkn(&entries, options)
}
