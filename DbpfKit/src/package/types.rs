//! Types for DBPF package handling

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::utils::parse_hex;

/// Well-known resource type ids
pub struct ResourceType;

impl ResourceType {
    /// Simdata tuning blob
    pub const DATA: u32 = 0x545AC67A;
}

/// Identity of a resource in a package: (group, instance, type).
///
/// A `ResourceId` is also a filter that matches only itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResourceId {
    pub group: u32,
    pub instance: u64,
    #[serde(rename = "type")]
    pub type_id: u32,
}

impl ResourceId {
    #[must_use]
    pub const fn new(group: u32, instance: u64, type_id: u32) -> Self {
        Self {
            group,
            instance,
            type_id,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}!{:016x}.{:08x}", self.group, self.instance, self.type_id)
    }
}

impl FromStr for ResourceId {
    type Err = String;

    /// Parse the `group!instance.type` hex form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, rest) = s
            .split_once('!')
            .ok_or_else(|| format!("invalid resource id '{s}' (expected group!instance.type)"))?;
        let (instance, type_id) = rest
            .split_once('.')
            .ok_or_else(|| format!("invalid resource id '{s}' (expected group!instance.type)"))?;

        Ok(Self {
            group: parse_hex(group)?,
            instance: parse_hex(instance)?,
            type_id: parse_hex(type_id)?,
        })
    }
}

/// Something that can select resources by id.
pub trait ResourceMatch: fmt::Display {
    fn matches(&self, id: &ResourceId) -> bool;
}

impl ResourceMatch for ResourceId {
    fn matches(&self, id: &ResourceId) -> bool {
        self == id
    }
}

/// Partial resource id: an unset component matches any value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    pub group: Option<u32>,
    pub instance: Option<u64>,
    pub type_id: Option<u32>,
}

impl ResourceFilter {
    /// A filter that matches every resource.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(group: Option<u32>, instance: Option<u64>, type_id: Option<u32>) -> Self {
        Self {
            group,
            instance,
            type_id,
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: u32) -> Self {
        self.group = Some(group);
        self
    }

    #[must_use]
    pub fn with_instance(mut self, instance: u64) -> Self {
        self.instance = Some(instance);
        self
    }

    #[must_use]
    pub fn with_type(mut self, type_id: u32) -> Self {
        self.type_id = Some(type_id);
        self
    }
}

impl ResourceMatch for ResourceFilter {
    fn matches(&self, id: &ResourceId) -> bool {
        self.group.is_none_or(|g| g == id.group)
            && self.instance.is_none_or(|i| i == id.instance)
            && self.type_id.is_none_or(|t| t == id.type_id)
    }
}

impl From<ResourceId> for ResourceFilter {
    fn from(id: ResourceId) -> Self {
        Self::new(Some(id.group), Some(id.instance), Some(id.type_id))
    }
}

impl fmt::Display for ResourceFilter {
    /// Same layout as `ResourceId`, with `*` for unset components.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.group {
            Some(g) => write!(f, "{g:08x}!")?,
            None => write!(f, "*!")?,
        }
        match self.instance {
            Some(i) => write!(f, "{i:016x}.")?,
            None => write!(f, "*.")?,
        }
        match self.type_id {
            Some(t) => write!(f, "{t:08x}"),
            None => write!(f, "*"),
        }
    }
}

/// Compression word from an index record: (codec id, order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CompressionTag {
    pub codec_id: u16,
    pub order: u16,
}

impl CompressionTag {
    /// Tag assumed when a record carries no compression word.
    pub const UNCOMPRESSED: Self = Self {
        codec_id: 0,
        order: 1,
    };

    #[must_use]
    pub const fn new(codec_id: u16, order: u16) -> Self {
        Self { codec_id, order }
    }

    #[must_use]
    pub fn codec(self) -> Codec {
        Codec::from(self.codec_id)
    }
}

impl Default for CompressionTag {
    fn default() -> Self {
        Self::UNCOMPRESSED
    }
}

/// Compression scheme selected by a codec id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Stored as-is (0x0000)
    Uncompressed,
    /// "Streamable" RefPack with a limited window (0xFFFE).
    ///
    /// Decoded exactly like [`Codec::RefPack`]; the window limit is assumed
    /// not to change the bitstream.
    RefPackStreamable,
    /// RefPack (0xFFFF)
    RefPack,
    /// Deflate (0x5A42)
    Deflate,
    /// Deleted record, no payload (0xFFE0)
    Deleted,
    /// Anything else
    Unknown(u16),
}

impl Codec {
    pub const UNCOMPRESSED_ID: u16 = 0x0000;
    pub const REFPACK_STREAMABLE_ID: u16 = 0xFFFE;
    pub const REFPACK_ID: u16 = 0xFFFF;
    pub const DEFLATE_ID: u16 = 0x5A42;
    pub const DELETED_ID: u16 = 0xFFE0;

    /// The on-disk codec id
    #[must_use]
    pub fn id(self) -> u16 {
        match self {
            Codec::Uncompressed => Self::UNCOMPRESSED_ID,
            Codec::RefPackStreamable => Self::REFPACK_STREAMABLE_ID,
            Codec::RefPack => Self::REFPACK_ID,
            Codec::Deflate => Self::DEFLATE_ID,
            Codec::Deleted => Self::DELETED_ID,
            Codec::Unknown(id) => id,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Codec::Uncompressed => "none",
            Codec::RefPackStreamable => "refpack-streamable",
            Codec::RefPack => "refpack",
            Codec::Deflate => "deflate",
            Codec::Deleted => "deleted",
            Codec::Unknown(_) => "unknown",
        }
    }
}

impl From<u16> for Codec {
    fn from(value: u16) -> Self {
        match value {
            Self::UNCOMPRESSED_ID => Codec::Uncompressed,
            Self::REFPACK_STREAMABLE_ID => Codec::RefPackStreamable,
            Self::REFPACK_ID => Codec::RefPack,
            Self::DEFLATE_ID => Codec::Deflate,
            Self::DELETED_ID => Codec::Deleted,
            other => Codec::Unknown(other),
        }
    }
}

/// One record of the package index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub id: ResourceId,
    /// Absolute offset of the stored bytes
    pub offset: u64,
    /// Stored size, with the extended-compression flag bit masked off
    pub size: u32,
    /// Size after decompression; meaningless for uncompressed entries
    pub size_decompressed: u32,
    pub compression: CompressionTag,
}

impl IndexEntry {
    #[must_use]
    pub fn codec(&self) -> Codec {
        self.compression.codec()
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.compression.codec_id == Codec::DELETED_ID
    }

    #[must_use]
    pub fn is_compressed(&self) -> bool {
        !matches!(self.codec(), Codec::Uncompressed | Codec::Deleted)
    }
}

/// Fixed header of a DBPF package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DbpfHeader {
    pub major: u32,
    pub minor: u32,
    /// Number of index records
    pub index_count: u32,
    /// Index size in bytes, as recorded by the writer (not used for parsing)
    pub index_size: u32,
    pub index_version: u32,
    /// Absolute offset of the index table
    pub index_offset: u32,
}
