//! RefPack (LZ77) decompression for package resources
//!
//! Stream layout: a flags byte, the `0xFB` marker, the big-endian output
//! size (4 bytes if flag bit `0x80` is set, else 3), then control codes
//! until the input ends. Each control code copies some literal bytes from
//! the input, then some bytes from earlier output:
//!
//! | First byte  | Length | Literals          | Copy count               | Distance                         |
//! |-------------|--------|-------------------|--------------------------|----------------------------------|
//! | `0x00-0x7F` | 2      | `b0 & 3`          | `((b0 & 0x1C) >> 2) + 3` | `((b0 & 0x60) << 3) + b1`        |
//! | `0x80-0xBF` | 3      | `(b1 & 0xC0) >> 6`| `(b0 & 0x3F) + 4`        | `((b1 & 0x3F) << 8) + b2`        |
//! | `0xC0-0xDF` | 4      | `b0 & 3`          | `((b0 & 0x0C) << 6) + b3 + 5` | `((b0 & 0x10) << 12) + (b1 << 8) + b2` |
//! | `0xE0-0xFB` | 1      | `((b0 & 0x1F) << 2) + 4` | 0                 |                                  |
//! | `0xFC-0xFF` | 1      | `b0 & 3`          | 0                        |                                  |
//!
//! A distance of 0 refers to the byte just written. Copies run one byte at a
//! time, so a distance shorter than the copy count repeats a pattern.

use crate::error::{Error, Result};

/// Second byte of every RefPack stream
pub const MARKER: u8 = 0xFB;

/// Flag bit in the first byte selecting a 4-byte output size
pub const FLAG_LARGE_SIZE: u8 = 0x80;

/// One decoded control code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ControlCode {
    literals: usize,
    copy_count: usize,
    distance: usize,
}

impl ControlCode {
    fn read(input: &[u8], pos: &mut usize) -> Result<Self> {
        let start = *pos;
        let b0 = usize::from(next_byte(input, pos, start)?);

        let code = match b0 {
            0x00..=0x7F => {
                let b1 = usize::from(next_byte(input, pos, start)?);
                Self {
                    literals: b0 & 0x03,
                    copy_count: ((b0 & 0x1C) >> 2) + 3,
                    distance: ((b0 & 0x60) << 3) + b1,
                }
            }
            0x80..=0xBF => {
                let b1 = usize::from(next_byte(input, pos, start)?);
                let b2 = usize::from(next_byte(input, pos, start)?);
                Self {
                    literals: (b1 & 0xC0) >> 6,
                    copy_count: (b0 & 0x3F) + 4,
                    distance: ((b1 & 0x3F) << 8) + b2,
                }
            }
            0xC0..=0xDF => {
                let b1 = usize::from(next_byte(input, pos, start)?);
                let b2 = usize::from(next_byte(input, pos, start)?);
                let b3 = usize::from(next_byte(input, pos, start)?);
                Self {
                    literals: b0 & 0x03,
                    copy_count: ((b0 & 0x0C) << 6) + b3 + 5,
                    distance: ((b0 & 0x10) << 12) + (b1 << 8) + b2,
                }
            }
            0xE0..=0xFB => Self {
                literals: ((b0 & 0x1F) << 2) + 4,
                copy_count: 0,
                distance: 0,
            },
            _ => Self {
                literals: b0 & 0x03,
                copy_count: 0,
                distance: 0,
            },
        };

        Ok(code)
    }
}

fn next_byte(input: &[u8], pos: &mut usize, code_start: usize) -> Result<u8> {
    let byte = input.get(*pos).copied().ok_or_else(|| {
        Error::corrupt(format!("control code at input offset {code_start} is truncated"))
    })?;
    *pos += 1;
    Ok(byte)
}

/// Read the stream header, returning the output size and where codes start.
fn read_header(input: &[u8]) -> Result<(usize, usize)> {
    if input.len() < 2 {
        return Err(Error::bad_header(format!(
            "stream is {} bytes, need at least 2",
            input.len()
        )));
    }
    if input[1] != MARKER {
        return Err(Error::bad_header(format!(
            "expected marker {MARKER:#04x}, found {:#04x}",
            input[1]
        )));
    }

    let size_len = if input[0] & FLAG_LARGE_SIZE != 0 { 4 } else { 3 };
    let size_bytes = input.get(2..2 + size_len).ok_or_else(|| {
        Error::bad_header(format!("missing {size_len}-byte output size"))
    })?;
    let output_len = size_bytes
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));

    Ok((output_len, 2 + size_len))
}

/// Decompress a RefPack stream.
///
/// The output buffer is allocated once at the size given in the stream
/// header and must be exactly filled when the input runs out.
///
/// # Errors
/// Returns [`Error::BadCompressedHeader`] if the header is short or lacks the
/// `0xFB` marker, and [`Error::CorruptStream`] if a code reads past the end
/// of the input, writes past the end of the output, refers to bytes before
/// the start of the output, or the output is not full at the end.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    let (output_len, mut ip) = read_header(input)?;
    let mut out = vec![0u8; output_len];
    let mut op = 0usize;

    while ip < input.len() {
        let code = ControlCode::read(input, &mut ip)?;

        if code.literals > 0 {
            let literal_end = ip + code.literals;
            if literal_end > input.len() {
                return Err(Error::corrupt(format!(
                    "{} literal bytes at input offset {ip} run past end of input ({} bytes)",
                    code.literals,
                    input.len()
                )));
            }
            if op + code.literals > output_len {
                return Err(Error::corrupt(format!(
                    "{} literal bytes at output offset {op} overflow output ({output_len} bytes)",
                    code.literals
                )));
            }
            out[op..op + code.literals].copy_from_slice(&input[ip..literal_end]);
            ip = literal_end;
            op += code.literals;
        }

        if code.copy_count > 0 {
            if code.distance >= op {
                return Err(Error::corrupt(format!(
                    "back-reference distance {} at output offset {op} points before start of output",
                    code.distance
                )));
            }
            if op + code.copy_count > output_len {
                return Err(Error::corrupt(format!(
                    "copy of {} bytes at output offset {op} overflows output ({output_len} bytes)",
                    code.copy_count
                )));
            }
            // Byte at a time: source and destination may overlap
            for _ in 0..code.copy_count {
                out[op] = out[op - 1 - code.distance];
                op += 1;
            }
        }
    }

    if op != output_len {
        return Err(Error::corrupt(format!(
            "input ended after {op} of {output_len} output bytes"
        )));
    }

    Ok(out)
}
