//! Error types for `DbpfKit`

use thiserror::Error;

use crate::package::ResourceId;

/// The error type for `DbpfKit` operations.
///
/// Variants fall into two groups. Format errors mean the container or a
/// compressed stream does not follow the expected layout; they are fatal to
/// the operation in progress. Lookup errors mean a requested entry could not
/// be resolved; the reader and its cached index stay usable after them
/// (see [`Error::is_lookup_error`]).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Container Format Errors ====================
    /// The file is not a DBPF package (missing DBPF magic).
    #[error("invalid package magic: expected DBPF, found {found:?}")]
    BadMagic {
        /// The four bytes found at the start of the file.
        found: [u8; 4],
    },

    /// The package version is not supported.
    #[error("unsupported DBPF version: {major}.{minor} (supported: 2.1)")]
    UnsupportedVersion {
        /// Major version from the header.
        major: u32,
        /// Minor version from the header.
        minor: u32,
    },

    /// The header does not point at an index table.
    #[error("package has no index table")]
    MissingIndex,

    /// A read ran past the end of the container.
    #[error("unexpected end of data: needed {needed} bytes at offset {offset:#x}")]
    Truncated {
        /// Absolute offset where the read started.
        offset: u64,
        /// Number of bytes the read needed.
        needed: usize,
    },

    // ==================== Compression Errors ====================
    /// The RefPack header is malformed.
    #[error("invalid RefPack header: {message}")]
    BadCompressedHeader {
        /// What is wrong with the header.
        message: String,
    },

    /// The RefPack stream does not decode cleanly.
    #[error("corrupt RefPack stream: {message}")]
    CorruptStream {
        /// Where and why decoding stopped.
        message: String,
    },

    /// The entry uses a codec id this crate does not know.
    #[error("unknown compression type: {codec:#06x}")]
    UnknownCompression {
        /// The codec id from the index entry.
        codec: u16,
    },

    /// Deflate decompression failed.
    #[error("deflate decompression failed: {message}")]
    DeflateFailed {
        /// The error message.
        message: String,
    },

    /// The decoded payload length disagrees with the index (strict mode only).
    #[error("decompressed size mismatch for {id}: index says {expected} bytes, decoded {actual}")]
    SizeMismatch {
        /// The resource being extracted.
        id: ResourceId,
        /// `size_decompressed` from the index entry.
        expected: u64,
        /// Actual decoded length.
        actual: u64,
    },

    // ==================== Lookup Errors ====================
    /// No entry matched the filter.
    #[error("no resource matches {filter}")]
    NotFound {
        /// Description of the filter used.
        filter: String,
    },

    /// More than one entry matched a lookup that requires a unique match.
    #[error("more than one resource matches {filter}")]
    Ambiguous {
        /// Description of the filter used.
        filter: String,
    },

    /// The entry is marked deleted and has no payload.
    #[error("resource {id} is deleted")]
    Deleted {
        /// The deleted resource.
        id: ResourceId,
    },

    /// Index position past the end of the cached index.
    #[error("index position {index} out of range (package has {len} entries)")]
    PositionOutOfRange {
        /// The requested position.
        index: usize,
        /// Number of entries in the index.
        len: usize,
    },
}

impl Error {
    /// Returns true for errors that leave the reader fully usable
    /// (not found, ambiguous, deleted, out-of-range position).
    #[must_use]
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. }
                | Error::Ambiguous { .. }
                | Error::Deleted { .. }
                | Error::PositionOutOfRange { .. }
        )
    }

    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Error::CorruptStream {
            message: message.into(),
        }
    }

    pub(crate) fn bad_header(message: impl Into<String>) -> Self {
        Error::BadCompressedHeader {
            message: message.into(),
        }
    }
}

/// A specialized Result type for `DbpfKit` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_errors_are_classified() {
        let id = ResourceId::new(1, 2, 3);
        assert!(Error::Deleted { id }.is_lookup_error());
        assert!(Error::PositionOutOfRange { index: 4, len: 2 }.is_lookup_error());
        assert!(!Error::MissingIndex.is_lookup_error());
        assert!(!Error::corrupt("x").is_lookup_error());
    }

    #[test]
    fn test_display_uses_resource_id_form() {
        let err = Error::Deleted {
            id: ResourceId::new(0x1, 0xABCD, 0x545AC67A),
        };
        assert_eq!(
            err.to_string(),
            "resource 00000001!000000000000abcd.545ac67a is deleted"
        );
    }
}
