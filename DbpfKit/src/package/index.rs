//! DBPF header and index table parsing

use std::io::{Read, Seek};

use byteorder::{ByteOrder, LittleEndian};

use super::{
    CompressionTag, DbpfHeader, IndexEntry, ResourceId, FLAG_GROUP_CONSTANT,
    FLAG_INSTANCE_EX_CONSTANT, FLAG_TYPE_CONSTANT, HEADER_INDEX_COUNT, HEADER_INDEX_OFFSET,
    HEADER_INDEX_SIZE, HEADER_INDEX_VERSION, HEADER_SIZE, MAGIC, SIZE_EXTENDED_FLAG,
    SUPPORTED_VERSION,
};
use crate::error::{Error, Result};
use crate::utils::ByteCursor;

/// Upper bound on index records reserved up front; the count comes from the file.
const MAX_PREALLOCATED_ENTRIES: usize = 1 << 16;

const KNOWN_FLAGS: u32 = FLAG_TYPE_CONSTANT | FLAG_GROUP_CONSTANT | FLAG_INSTANCE_EX_CONSTANT;

/// Decodes a package header and its index table.
pub struct ArchiveIndexParser<'a, R: Read + Seek> {
    cursor: &'a mut ByteCursor<R>,
}

impl<'a, R: Read + Seek> ArchiveIndexParser<'a, R> {
    pub fn new(cursor: &'a mut ByteCursor<R>) -> Self {
        Self { cursor }
    }

    /// Read the header, then every index record in table order.
    pub fn parse(mut self) -> Result<(DbpfHeader, Vec<IndexEntry>)> {
        let header = self.read_header()?;
        let entries = self.read_index(&header)?;
        Ok((header, entries))
    }

    /// Read and validate the fixed header.
    ///
    /// Magic and version are checked before the rest of the header is read,
    /// so an unsupported package fails without touching the index.
    pub fn read_header(&mut self) -> Result<DbpfHeader> {
        self.cursor.seek(0)?;

        let magic = self.cursor.read_array::<4>()?;
        if magic != MAGIC {
            return Err(Error::BadMagic { found: magic });
        }

        let major = self.cursor.read_u32()?;
        let minor = self.cursor.read_u32()?;
        if (major, minor) != SUPPORTED_VERSION {
            return Err(Error::UnsupportedVersion { major, minor });
        }

        self.cursor.seek(0)?;
        let block = self.cursor.read_array::<HEADER_SIZE>()?;
        let field = |at: usize| LittleEndian::read_u32(&block[at..at + 4]);

        let header = DbpfHeader {
            major,
            minor,
            index_count: field(HEADER_INDEX_COUNT),
            index_size: field(HEADER_INDEX_SIZE),
            index_version: field(HEADER_INDEX_VERSION),
            index_offset: field(HEADER_INDEX_OFFSET),
        };

        tracing::debug!(
            "DBPF {}.{} header: {} entries, index at {:#x} ({} bytes, format {})",
            header.major,
            header.minor,
            header.index_count,
            header.index_offset,
            header.index_size,
            header.index_version
        );

        Ok(header)
    }

    /// Read the index table described by `header`.
    pub fn read_index(&mut self, header: &DbpfHeader) -> Result<Vec<IndexEntry>> {
        if header.index_offset == 0 {
            return Err(Error::MissingIndex);
        }

        self.cursor.seek(u64::from(header.index_offset))?;
        let flags = self.cursor.read_u32()?;
        if flags & !KNOWN_FLAGS != 0 {
            tracing::warn!("Ignoring unknown index flag bits {:#x}", flags & !KNOWN_FLAGS);
        }

        // Shared fields are stored once, in this order, right after the flags word
        let const_type = self.read_if(flags & FLAG_TYPE_CONSTANT != 0)?;
        let const_group = self.read_if(flags & FLAG_GROUP_CONSTANT != 0)?;
        let const_instance_ex = self.read_if(flags & FLAG_INSTANCE_EX_CONSTANT != 0)?;

        let count = header.index_count as usize;
        let mut entries = Vec::with_capacity(count.min(MAX_PREALLOCATED_ENTRIES));

        for _ in 0..count {
            let type_id = match const_type {
                Some(t) => t,
                None => self.cursor.read_u32()?,
            };
            let group = match const_group {
                Some(g) => g,
                None => self.cursor.read_u32()?,
            };
            let instance_ex = match const_instance_ex {
                Some(i) => i,
                None => self.cursor.read_u32()?,
            };
            let instance_low = self.cursor.read_u32()?;
            let offset = self.cursor.read_u32()?;
            let raw_size = self.cursor.read_u32()?;
            let size_decompressed = self.cursor.read_u32()?;

            let compression = if raw_size & SIZE_EXTENDED_FLAG != 0 {
                let codec_id = self.cursor.read_u16()?;
                let order = self.cursor.read_u16()?;
                CompressionTag::new(codec_id, order)
            } else {
                CompressionTag::UNCOMPRESSED
            };

            entries.push(IndexEntry {
                id: ResourceId::new(
                    group,
                    (u64::from(instance_ex) << 32) | u64::from(instance_low),
                    type_id,
                ),
                offset: u64::from(offset),
                size: raw_size & !SIZE_EXTENDED_FLAG,
                size_decompressed,
                compression,
            });
        }

        tracing::debug!("Parsed {} index entries (flags {:#x})", entries.len(), flags);

        Ok(entries)
    }

    fn read_if(&mut self, present: bool) -> Result<Option<u32>> {
        if present {
            self.cursor.read_u32().map(Some)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(major: u32, minor: u32, count: u32, index_offset: u32) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..8].copy_from_slice(&major.to_le_bytes());
        buf[8..12].copy_from_slice(&minor.to_le_bytes());
        buf[36..40].copy_from_slice(&count.to_le_bytes());
        buf[56..60].copy_from_slice(&3u32.to_le_bytes());
        buf[60..64].copy_from_slice(&index_offset.to_le_bytes());
        buf
    }

    fn push_u32s(buf: &mut Vec<u8>, values: &[u32]) {
        for v in values {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn parse(data: Vec<u8>) -> Result<(DbpfHeader, Vec<IndexEntry>)> {
        let mut cursor = ByteCursor::new(Cursor::new(data));
        ArchiveIndexParser::new(&mut cursor).parse()
    }

    #[test]
    fn test_bad_magic() {
        let mut data = header_bytes(2, 1, 0, 96);
        data[0..4].copy_from_slice(b"DBPX");
        assert!(matches!(parse(data), Err(Error::BadMagic { found }) if &found == b"DBPX"));
    }

    #[test]
    fn test_unsupported_version_skips_index() {
        // Index offset points past the end; an index scan would fail with Truncated
        let data = header_bytes(2, 0, 5, 0xFFFF);
        assert!(matches!(
            parse(data),
            Err(Error::UnsupportedVersion { major: 2, minor: 0 })
        ));
    }

    #[test]
    fn test_unsupported_version_on_short_file() {
        let mut data = MAGIC.to_vec();
        push_u32s(&mut data, &[3, 0]);
        assert!(matches!(parse(data), Err(Error::UnsupportedVersion { major: 3, minor: 0 })));
    }

    #[test]
    fn test_missing_index() {
        let data = header_bytes(2, 1, 1, 0);
        assert!(matches!(parse(data), Err(Error::MissingIndex)));
    }

    #[test]
    fn test_short_header_is_truncated() {
        let mut data = header_bytes(2, 1, 0, 96);
        data.truncate(50);
        assert!(matches!(parse(data), Err(Error::Truncated { offset: 0, needed: 96 })));
    }

    #[test]
    fn test_records_without_constants() {
        let mut data = header_bytes(2, 1, 2, 96);
        push_u32s(&mut data, &[0]);
        // type, group, instance-ex, instance-low, offset, size, size_decompressed
        push_u32s(&mut data, &[0xAA, 0xBB, 0x1, 0x2, 200, 10, 10]);
        push_u32s(&mut data, &[0xCC, 0xDD, 0x0, 0x3, 210, 0x8000_0005, 20]);
        data.extend_from_slice(&0xFFFFu16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());

        let (header, entries) = parse(data).unwrap();
        assert_eq!(header.index_count, 2);
        assert_eq!(header.index_version, 3);
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].id, ResourceId::new(0xBB, 0x1_0000_0002, 0xAA));
        assert_eq!(entries[0].offset, 200);
        assert_eq!(entries[0].compression, CompressionTag::UNCOMPRESSED);

        assert_eq!(entries[1].id, ResourceId::new(0xDD, 0x3, 0xCC));
        assert_eq!(entries[1].size, 5);
        assert_eq!(entries[1].size_decompressed, 20);
        assert_eq!(entries[1].compression, CompressionTag::new(0xFFFF, 1));
    }

    #[test]
    fn test_all_constant_fields() {
        let mut data = header_bytes(2, 1, 2, 96);
        // flags, then shared type, group, instance-ex
        push_u32s(&mut data, &[0x7, 0x545AC67A, 0x80000000, 0x00ABCDEF]);
        // instance-low, offset, size, size_decompressed
        push_u32s(&mut data, &[0x10, 300, 4, 4]);
        push_u32s(&mut data, &[0x11, 304, 0x8000_0006, 12]);
        data.extend_from_slice(&0xFFE0u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        let end = data.len();

        let mut cursor = ByteCursor::new(Cursor::new(data));
        let (_, entries) = ArchiveIndexParser::new(&mut cursor).parse().unwrap();
        // Nothing beyond the shared fields and short records was consumed
        assert_eq!(cursor.position().unwrap(), end as u64);

        assert_eq!(entries[0].id, ResourceId::new(0x80000000, 0x00ABCDEF_00000010, 0x545AC67A));
        assert_eq!(entries[1].id, ResourceId::new(0x80000000, 0x00ABCDEF_00000011, 0x545AC67A));
        assert!(entries[1].is_deleted());
        assert_eq!(entries[1].size, 6);
    }

    #[test]
    fn test_group_constant_only() {
        let mut data = header_bytes(2, 1, 1, 96);
        push_u32s(&mut data, &[FLAG_GROUP_CONSTANT, 0x42]);
        // type, instance-ex, instance-low, offset, size, size_decompressed
        push_u32s(&mut data, &[0x9, 0x0, 0x5, 100, 1, 1]);

        let (_, entries) = parse(data).unwrap();
        assert_eq!(entries[0].id, ResourceId::new(0x42, 0x5, 0x9));
    }

    #[test]
    fn test_truncated_index() {
        let mut data = header_bytes(2, 1, 2, 96);
        push_u32s(&mut data, &[0]);
        push_u32s(&mut data, &[0xAA, 0xBB, 0x1, 0x2, 200, 10, 10]);
        push_u32s(&mut data, &[0xCC, 0xDD]);
        assert!(matches!(parse(data), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_truncated_compression_word() {
        let mut data = header_bytes(2, 1, 1, 96);
        push_u32s(&mut data, &[0]);
        push_u32s(&mut data, &[0xAA, 0xBB, 0x1, 0x2, 200, 0x8000_000A, 10]);
        data.extend_from_slice(&0xFFFFu16.to_le_bytes());
        assert!(matches!(parse(data), Err(Error::Truncated { needed: 2, .. })));
    }
}
