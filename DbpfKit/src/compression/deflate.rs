//! Deflate decompression for codec `0x5A42` resources

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};

use super::MAX_PREALLOCATION;
use crate::error::{Error, Result};

/// Decompress a deflate resource.
///
/// Resources are expected to hold a raw deflate stream. If that fails and the
/// data starts with a zlib header, it is decoded as a zlib stream instead.
/// The caller checks the output length against the index.
///
/// # Errors
/// Returns [`Error::DeflateFailed`] if neither decoding succeeds.
pub fn decompress(compressed: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut decompressed = Vec::with_capacity(expected_size.min(MAX_PREALLOCATION));

    let raw_error = match DeflateDecoder::new(compressed).read_to_end(&mut decompressed) {
        Ok(_) => return Ok(decompressed),
        Err(e) => e,
    };

    if !has_zlib_header(compressed) {
        return Err(Error::DeflateFailed {
            message: raw_error.to_string(),
        });
    }

    tracing::debug!("Raw deflate failed ({raw_error}), retrying as zlib stream");
    decompressed.clear();
    ZlibDecoder::new(compressed)
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::DeflateFailed {
            message: format!("raw: {raw_error}; zlib: {e}"),
        })?;

    Ok(decompressed)
}

/// CMF/FLG pair with method 8 and a valid check value
fn has_zlib_header(data: &[u8]) -> bool {
    match data {
        [cmf, flg, ..] => {
            cmf & 0x0F == 8 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0
        }
        _ => false,
    }
}
