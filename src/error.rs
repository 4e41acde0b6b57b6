//! Error types for the offset-rewriting engine

use std::io;

/// Result type for zip-prefixer operations
pub type Result<T> = std::result::Result<T, ZipOffsetError>;

/// Error kinds that can occur while locating or rewriting ZIP offsets
#[derive(Debug)]
pub enum ZipOffsetError {
    /// The backward scan for an End of Central Directory Record found
    /// nothing within the search window: not a ZIP file, or a broken one.
    NotAZip,
    /// A structural record (CFH, LFH, ZIP64 EOCDL/EOCDR, ZIP64 EIEF) was
    /// missing where the archive said it would be, or was malformed.
    StructuralZip(String),
    /// A 32-bit offset would exceed `2^32 - 2` after applying the
    /// displacement, and the archive is not already ZIP64.
    Overflow {
        /// The offset before displacement was applied.
        offset: u64,
        /// The displacement that would have pushed it out of range.
        displacement: i64,
    },
    /// Underlying file I/O failure.
    Io(io::Error),
}

impl std::fmt::Display for ZipOffsetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZipOffsetError::NotAZip => {
                write!(f, "not a ZIP file, or a broken one")
            }
            ZipOffsetError::StructuralZip(msg) => write!(f, "malformed ZIP structure: {}", msg),
            ZipOffsetError::Overflow {
                offset,
                displacement,
            } => write!(
                f,
                "cannot accommodate new offsets without transitioning to ZIP64: \
                 offset {} + displacement {} would exceed 2^32",
                offset, displacement
            ),
            ZipOffsetError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ZipOffsetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ZipOffsetError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ZipOffsetError {
    fn from(err: io::Error) -> Self {
        ZipOffsetError::Io(err)
    }
}
