//! # DbpfKit
//!
//! A pure-Rust reader for The Sims 4 DBPF package files.
//!
//! ## Supported Formats
//!
//! - **DBPF 2.1 packages** - Header and resource index parsing
//! - **RefPack** - The Maxis LZ77 variant used for most compressed resources
//! - **Deflate** - zlib-family compressed resources
//!
//! ## Quick Start
//!
//! ```no_run
//! use dbpfkit::prelude::*;
//!
//! let reader = DbpfReader::open("ClientFullBuild0.package")?;
//! println!("Found {} resources", reader.len());
//!
//! // All simdata resources
//! let filter = ResourceFilter::any().with_type(ResourceType::DATA);
//! for entry in reader.scan(Some(&filter)) {
//!     let data = reader.extract(entry)?;
//!     println!("{} ({} bytes)", entry.id, data.len());
//! }
//!
//! // One resource by full id
//! let id: ResourceId = "00000000!0000000000012345.545ac67a".parse()?;
//! let data = reader.extract_by(&id)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `dbpfkit` command-line binary

pub mod compression;
pub mod error;
pub mod package;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::package::{
        Codec, CompressionTag, DbpfHeader, DbpfReader, IndexEntry, ReaderOptions, ResourceFilter,
        ResourceId, ResourceMatch, ResourceType, SizeCheck,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
