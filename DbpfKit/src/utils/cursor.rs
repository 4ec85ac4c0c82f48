//! Seekable little-endian byte cursor
//!
//! Wraps any `Read + Seek` source. Short reads are reported as
//! [`Error::Truncated`] with the absolute offset of the failed read, so
//! parsers never see a bare `UnexpectedEof`.

use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::ops::{Deref, DerefMut};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Sentinel used by relative 32-bit offsets to mean "no target".
const NULL_OFF32: i32 = i32::MIN;

/// Byte cursor with absolute positioning and scoped repositioning.
#[derive(Debug)]
pub struct ByteCursor<R: Read + Seek> {
    inner: R,
}

impl<R: Read + Seek> ByteCursor<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Give back the wrapped source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Seek to an absolute offset.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Current absolute offset.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Read exactly `n` bytes, failing with `Truncated` if fewer remain.
    pub fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let offset = self.position()?;
        let mut buf = vec![0u8; n];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| truncated(e, offset, n))?;
        Ok(buf)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let offset = self.position()?;
        let mut buf = [0u8; N];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| truncated(e, offset, N))?;
        Ok(buf)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let offset = self.position()?;
        self.inner
            .read_u16::<LittleEndian>()
            .map_err(|e| truncated(e, offset, 2))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let offset = self.position()?;
        self.inner
            .read_u32::<LittleEndian>()
            .map_err(|e| truncated(e, offset, 4))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let offset = self.position()?;
        self.inner
            .read_i32::<LittleEndian>()
            .map_err(|e| truncated(e, offset, 4))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let offset = self.position()?;
        self.inner
            .read_u64::<LittleEndian>()
            .map_err(|e| truncated(e, offset, 8))
    }

    /// Read a null-terminated string. The terminator is consumed but not returned.
    pub fn read_cstring(&mut self) -> Result<Vec<u8>> {
        let start = self.position()?;
        let mut out = Vec::new();
        loop {
            let byte = self
                .inner
                .read_u8()
                .map_err(|e| truncated(e, start, out.len() + 1))?;
            if byte == 0 {
                return Ok(out);
            }
            out.push(byte);
        }
    }

    /// Read a signed offset relative to where it is stored and resolve it
    /// to an absolute offset. Returns `None` for the null sentinel.
    pub fn read_off32(&mut self) -> Result<Option<u64>> {
        let base = self.position()?;
        let rel = self.read_i32()?;
        if rel == NULL_OFF32 {
            return Ok(None);
        }
        base.checked_add_signed(i64::from(rel))
            .map(Some)
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!("relative offset {rel} at {base:#x} points before start of data"),
                ))
            })
    }

    /// Follow a relative offset and read the null-terminated string it points
    /// at, leaving the cursor just past the offset field.
    pub fn read_relstring(&mut self) -> Result<Option<Vec<u8>>> {
        match self.read_off32()? {
            Some(target) => {
                let mut at = self.at(target)?;
                at.read_cstring().map(Some)
            }
            None => Ok(None),
        }
    }

    /// Advance to the next multiple of `size`.
    pub fn align(&mut self, size: u64) -> Result<()> {
        if size > 1 {
            let pos = self.position()?;
            let aligned = pos.div_ceil(size) * size;
            if aligned != pos {
                self.seek(aligned)?;
            }
        }
        Ok(())
    }

    /// Temporarily move to `offset`. The previous position is restored when
    /// the returned guard is dropped.
    pub fn at(&mut self, offset: u64) -> Result<Reposition<'_, R>> {
        let saved = self.position()?;
        self.seek(offset)?;
        Ok(Reposition {
            cursor: self,
            saved,
        })
    }
}

fn truncated(err: std::io::Error, offset: u64, needed: usize) -> Error {
    if err.kind() == ErrorKind::UnexpectedEof {
        Error::Truncated { offset, needed }
    } else {
        Error::Io(err)
    }
}

/// Guard returned by [`ByteCursor::at`].
pub struct Reposition<'a, R: Read + Seek> {
    cursor: &'a mut ByteCursor<R>,
    saved: u64,
}

impl<R: Read + Seek> Deref for Reposition<'_, R> {
    type Target = ByteCursor<R>;

    fn deref(&self) -> &Self::Target {
        self.cursor
    }
}

impl<R: Read + Seek> DerefMut for Reposition<'_, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.cursor
    }
}

impl<R: Read + Seek> Drop for Reposition<'_, R> {
    fn drop(&mut self) {
        if let Err(e) = self.cursor.seek(self.saved) {
            tracing::warn!("Failed to restore cursor position {:#x}: {}", self.saved, e);
        }
    }
}
