//! LZMA codec adapter.
//!
//! Compressed regions in a CFL container carry the classic 5-byte LZMA
//! properties header (one `lc/lp/pb` byte plus a little-endian dictionary
//! size) directly followed by the range-coded stream. Unlike `.lzma` files
//! there is no 8-byte unpacked size, so the stream is decoded until its
//! end-of-stream marker (or the end of the input).

use lzma_rs::decompress::{Options, UnpackedSize};
use tracing::trace;

use crate::{Error, Result};

/// Size of the LZMA properties header at the start of a compressed region.
pub const PROPERTIES_SIZE: usize = 5;

/// Largest valid `lc/lp/pb` properties byte (`(pb * 5 + lp) * 9 + lc`).
const MAX_PROPERTIES_BYTE: u8 = 9 * 5 * 5 - 1;

/// Decompress an LZMA region stored as properties followed by the raw stream.
pub fn decompress_lzma(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < PROPERTIES_SIZE {
        return Err(codec_error(format!(
            "region of {} bytes is shorter than the {}-byte properties header",
            data.len(),
            PROPERTIES_SIZE
        )));
    }

    let (properties, stream) = data.split_at(PROPERTIES_SIZE);
    if properties[0] > MAX_PROPERTIES_BYTE {
        return Err(codec_error(format!(
            "invalid properties byte {:#04x}",
            properties[0]
        )));
    }
    let dict_size = u32::from_le_bytes([properties[1], properties[2], properties[3], properties[4]]);
    trace!(
        properties = properties[0],
        dict_size,
        stream_len = stream.len(),
        "decoding LZMA region"
    );

    // lzma-rs parses the properties itself; skipping the unpacked size makes
    // it decode to end of input.
    let options = Options {
        unpacked_size: UnpackedSize::UseProvided(None),
        ..Default::default()
    };

    let mut input = data;
    let mut output = Vec::with_capacity(stream.len() * 2);
    lzma_rs::lzma_decompress_with_options(&mut input, &mut output, &options)
        .map_err(|e| codec_error(e.to_string()))?;

    Ok(output)
}

fn codec_error(reason: String) -> Error {
    Error::Codec {
        region: "LZMA region".to_string(),
        reason,
    }
}
