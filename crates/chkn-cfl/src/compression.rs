//! Compression scheme ids used by the container.

use std::borrow::Cow;

use crate::codec;
use crate::Result;

/// Compression applied to the directory blob or to an entry payload.
///
/// Only id `4` means anything to the format (LZMA); every other id is
/// treated as stored and kept so it can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Bytes are stored as-is.
    Stored(i32),
    /// LZMA with a 5-byte properties prefix.
    Lzma,
}

impl Compression {
    /// On-disk id for LZMA.
    pub const LZMA_ID: i32 = 4;

    /// Get the on-disk id.
    #[inline]
    pub fn id(self) -> i32 {
        match self {
            Compression::Stored(id) => id,
            Compression::Lzma => Self::LZMA_ID,
        }
    }

    /// Check if this is LZMA compression.
    #[inline]
    pub fn is_lzma(self) -> bool {
        self == Compression::Lzma
    }

    /// Undo this compression, borrowing the input when it is stored.
    pub fn decode(self, data: &[u8]) -> Result<Cow<'_, [u8]>> {
        match self {
            Compression::Stored(_) => Ok(Cow::Borrowed(data)),
            Compression::Lzma => codec::decompress_lzma(data).map(Cow::Owned),
        }
    }
}

impl From<i32> for Compression {
    fn from(id: i32) -> Self {
        match id {
            Self::LZMA_ID => Compression::Lzma,
            other => Compression::Stored(other),
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::Stored(0) => f.write_str("stored"),
            Compression::Stored(id) => write!(f, "stored({id})"),
            Compression::Lzma => f.write_str("lzma"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_ids_are_stored() {
        assert_eq!(Compression::from(4), Compression::Lzma);
        assert_eq!(Compression::from(0), Compression::Stored(0));
        assert_eq!(Compression::from(-7).id(), -7);
        assert!(!Compression::from(5).is_lzma());
    }

    #[test]
    fn test_stored_decode_borrows() {
        let data = b"raw bytes";
        let decoded = Compression::Stored(1).decode(data).unwrap();
        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(&*decoded, data);
    }
}
