//! DBPF package reader
//!
//! DBPF is the container used for Sims 4 `.package` files: a fixed header,
//! the stored resource payloads, and an index table describing each
//! resource's identity, location, size and compression.

mod index;
mod reader;
mod types;

pub use index::ArchiveIndexParser;
pub use reader::{DbpfReader, ReaderOptions, SizeCheck};
pub use types::*;

/// DBPF magic bytes
pub const MAGIC: [u8; 4] = *b"DBPF";

/// The only supported (major, minor) container version
pub const SUPPORTED_VERSION: (u32, u32) = (2, 1);

/// Size of the fixed header region
pub const HEADER_SIZE: usize = 96;

/// Header field offsets
pub(crate) const HEADER_INDEX_COUNT: usize = 36;
pub(crate) const HEADER_INDEX_SIZE: usize = 44;
pub(crate) const HEADER_INDEX_VERSION: usize = 56;
pub(crate) const HEADER_INDEX_OFFSET: usize = 60;

/// Index flag: every record shares one type id
pub const FLAG_TYPE_CONSTANT: u32 = 1;
/// Index flag: every record shares one group id
pub const FLAG_GROUP_CONSTANT: u32 = 2;
/// Index flag: every record shares the high 32 bits of the instance
pub const FLAG_INSTANCE_EX_CONSTANT: u32 = 4;

/// High bit of a record's size field: an extended compression word follows
pub const SIZE_EXTENDED_FLAG: u32 = 0x8000_0000;
