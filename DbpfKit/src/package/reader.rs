//! DBPF package reader with a cached index

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use super::{ArchiveIndexParser, DbpfHeader, IndexEntry, ResourceMatch};
use crate::compression;
use crate::error::{Error, Result};
use crate::utils::ByteCursor;

/// What to do when a decoded payload's length differs from the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeCheck {
    /// Fail the extraction with [`Error::SizeMismatch`]
    Strict,
    /// Log a warning and return the payload as decoded
    #[default]
    Lenient,
}

/// Options applied to every extraction from a reader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    pub size_check: SizeCheck,
}

impl ReaderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that reject decompressed-size mismatches
    #[must_use]
    pub fn strict() -> Self {
        Self {
            size_check: SizeCheck::Strict,
        }
    }

    #[must_use]
    pub fn with_size_check(mut self, size_check: SizeCheck) -> Self {
        self.size_check = size_check;
        self
    }
}

/// Reader for a DBPF package.
///
/// The header and index are parsed once when the reader is built and never
/// re-scanned. Lookups run against the cached index; extraction seeks and
/// reads under a lock, then decodes outside it, so a reader can be shared
/// between threads.
pub struct DbpfReader<R: Read + Seek = BufReader<File>> {
    source: Mutex<ByteCursor<R>>,
    header: DbpfHeader,
    entries: Vec<IndexEntry>,
    options: ReaderOptions,
}

impl DbpfReader<BufReader<File>> {
    /// Open a package file with default options
    ///
    /// # Example
    /// ```no_run
    /// use dbpfkit::package::DbpfReader;
    /// let reader = DbpfReader::open("ClientFullBuild0.package")?;
    /// println!("{} resources", reader.len());
    /// # Ok::<(), dbpfkit::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened, or a format error
    /// ([`Error::BadMagic`], [`Error::UnsupportedVersion`],
    /// [`Error::MissingIndex`], [`Error::Truncated`]) if it is not a readable
    /// DBPF 2.1 package.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ReaderOptions::default())
    }

    /// Open a package file
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Opening package {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), options)
    }
}

impl<R: Read + Seek> DbpfReader<R> {
    /// Build a reader over any seekable source, parsing its index eagerly.
    pub fn from_reader(reader: R, options: ReaderOptions) -> Result<Self> {
        let mut cursor = ByteCursor::new(reader);
        let (header, entries) = ArchiveIndexParser::new(&mut cursor).parse()?;

        Ok(Self {
            source: Mutex::new(cursor),
            header,
            entries,
            options,
        })
    }

    pub fn header(&self) -> &DbpfHeader {
        &self.header
    }

    pub fn options(&self) -> ReaderOptions {
        self.options
    }

    /// All index entries in table order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over cached entries in table order, keeping only those the
    /// filter matches (all of them when `filter` is `None`).
    pub fn scan<'a, 'f>(
        &'a self,
        filter: Option<&'f dyn ResourceMatch>,
    ) -> impl Iterator<Item = &'a IndexEntry> + use<'a, 'f, R> {
        self.entries
            .iter()
            .filter(move |entry| filter.is_none_or(|f| f.matches(&entry.id)))
    }

    /// Find the single entry matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing matches and
    /// [`Error::Ambiguous`] if a second match exists.
    pub fn lookup_one(&self, filter: &dyn ResourceMatch) -> Result<&IndexEntry> {
        let mut matches = self.scan(Some(filter));

        let first = matches.next().ok_or_else(|| Error::NotFound {
            filter: filter.to_string(),
        })?;

        if matches.next().is_some() {
            return Err(Error::Ambiguous {
                filter: filter.to_string(),
            });
        }

        Ok(first)
    }

    /// Entry at position `index` in table order
    pub fn get_by_position(&self, index: usize) -> Result<&IndexEntry> {
        self.entries.get(index).ok_or(Error::PositionOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    /// Read the stored bytes of an entry without decoding them.
    pub fn read_raw(&self, entry: &IndexEntry) -> Result<Vec<u8>> {
        let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        source.seek(entry.offset)?;
        source.read(entry.size as usize)
    }

    /// Extract an entry's payload, decompressing it if its codec requires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Deleted`] for deleted records (before any I/O),
    /// [`Error::Truncated`] if the stored bytes run past the end of the file,
    /// [`Error::UnknownCompression`] for unrecognised codecs, and the
    /// codec's own errors for bad compressed data. With
    /// [`SizeCheck::Strict`], a payload whose decoded length differs from
    /// `size_decompressed` fails with [`Error::SizeMismatch`].
    pub fn extract(&self, entry: &IndexEntry) -> Result<Vec<u8>> {
        if entry.is_deleted() {
            return Err(Error::Deleted { id: entry.id });
        }

        let raw = self.read_raw(entry)?;
        if !entry.is_compressed() {
            return Ok(raw);
        }

        let data = compression::decompress(&raw, entry.codec(), entry.size_decompressed as usize)?;
        self.check_size(entry, data.len())?;
        Ok(data)
    }

    /// Look up the single entry matching `filter` and extract it.
    pub fn extract_by(&self, filter: &dyn ResourceMatch) -> Result<Vec<u8>> {
        let entry = self.lookup_one(filter)?;
        self.extract(entry)
    }

    /// Extract the entry at position `index`.
    pub fn extract_at(&self, index: usize) -> Result<Vec<u8>> {
        let entry = self.get_by_position(index)?;
        self.extract(entry)
    }

    fn check_size(&self, entry: &IndexEntry, actual: usize) -> Result<()> {
        let expected = entry.size_decompressed as usize;
        if actual == expected {
            return Ok(());
        }

        match self.options.size_check {
            SizeCheck::Strict => Err(Error::SizeMismatch {
                id: entry.id,
                expected: expected as u64,
                actual: actual as u64,
            }),
            SizeCheck::Lenient => {
                tracing::warn!(
                    "Decompressed size mismatch for {}: index says {} bytes, decoded {}",
                    entry.id,
                    expected,
                    actual
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{CompressionTag, ResourceFilter, ResourceId, HEADER_SIZE, MAGIC};
    use std::io::Cursor;

    /// Package with three uncompressed entries and one deleted record.
    fn sample_package() -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..8].copy_from_slice(&2u32.to_le_bytes());
        buf[8..12].copy_from_slice(&1u32.to_le_bytes());
        buf[36..40].copy_from_slice(&4u32.to_le_bytes());

        let payloads: [&[u8]; 3] = [b"alpha", b"beta", b"gamma"];
        let mut offsets = Vec::new();
        for payload in payloads {
            offsets.push(buf.len() as u32);
            buf.extend_from_slice(payload);
        }

        let index_offset = buf.len() as u32;
        buf[60..64].copy_from_slice(&index_offset.to_le_bytes());

        // Shared group only
        for v in [2u32, 0x10] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        let records = [
            (1u32, 0u32, 100u32, offsets[0], 5u32),
            (1, 0, 101, offsets[1], 4),
            (2, 0, 100, offsets[2], 5),
        ];
        for (type_id, ex, low, offset, size) in records {
            for v in [type_id, ex, low, offset, size, size] {
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
        // Deleted record pointing far outside the file
        for v in [3u32, 0, 102, 0xFFFF_FFF0, 0x8000_1000, 0x1000] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&0xFFE0u16.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf
    }

    fn reader() -> DbpfReader<Cursor<Vec<u8>>> {
        DbpfReader::from_reader(Cursor::new(sample_package()), ReaderOptions::default()).unwrap()
    }

    #[test]
    fn test_scan_all_in_table_order() {
        let reader = reader();
        let instances: Vec<u64> = reader.scan(None).map(|e| e.id.instance).collect();
        assert_eq!(instances, vec![100, 101, 100, 102]);
        assert_eq!(reader.len(), reader.header().index_count as usize);
    }

    #[test]
    fn test_scan_is_restartable() {
        let reader = reader();
        let filter = ResourceFilter::any().with_type(1);
        assert_eq!(reader.scan(Some(&filter)).count(), 2);
        assert_eq!(reader.scan(Some(&filter)).count(), 2);
    }

    #[test]
    fn test_lookup_one_outcomes() {
        let reader = reader();

        let entry = reader
            .lookup_one(&ResourceId::new(0x10, 101, 1))
            .unwrap();
        assert_eq!(entry.size, 4);

        let ambiguous = ResourceFilter::any().with_instance(100);
        assert!(matches!(reader.lookup_one(&ambiguous), Err(Error::Ambiguous { .. })));

        let missing = ResourceFilter::any().with_group(0x11);
        assert!(matches!(reader.lookup_one(&missing), Err(Error::NotFound { .. })));

        // Reader still usable after lookup failures
        assert_eq!(reader.extract_by(&ResourceId::new(0x10, 100, 2)).unwrap(), b"gamma");
    }

    #[test]
    fn test_get_by_position() {
        let reader = reader();
        assert_eq!(reader.get_by_position(1).unwrap().id.instance, 101);
        assert!(matches!(
            reader.get_by_position(4),
            Err(Error::PositionOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_extract_uncompressed_returns_stored_bytes() {
        let reader = reader();
        assert_eq!(reader.extract_at(0).unwrap(), b"alpha");
        assert_eq!(reader.extract_at(1).unwrap(), b"beta");
    }

    #[test]
    fn test_extract_deleted_fails_without_io() {
        let reader = reader();
        let err = reader.extract_at(3).unwrap_err();
        assert!(matches!(err, Error::Deleted { id } if id.instance == 102));
        assert!(err.is_lookup_error());
    }

    #[test]
    fn test_extract_unknown_codec() {
        let reader = reader();
        let mut entry = *reader.get_by_position(0).unwrap();
        entry.compression = CompressionTag::new(0x1234, 1);
        assert!(matches!(
            reader.extract(&entry),
            Err(Error::UnknownCompression { codec: 0x1234 })
        ));
    }

    #[test]
    fn test_extract_past_end_is_truncated() {
        let reader = reader();
        let mut entry = *reader.get_by_position(2).unwrap();
        entry.size = 4096;
        assert!(matches!(reader.extract(&entry), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_reader_is_sync() {
        fn assert_sync<T: Sync>() {}
        assert_sync::<DbpfReader<Cursor<Vec<u8>>>>();
        assert_sync::<DbpfReader>();
    }
}
