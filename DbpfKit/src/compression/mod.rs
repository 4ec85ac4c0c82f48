//! Compression utilities

use crate::error::{Error, Result};
use crate::package::Codec;

pub mod deflate;
pub mod refpack;

/// Upper bound on output bytes reserved from an untrusted size field.
pub(crate) const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

/// Decode stored bytes according to `codec`.
///
/// `size_decompressed` is the index's expected output size; it sizes the
/// deflate output buffer. RefPack streams carry their own output size.
///
/// # Errors
/// Returns [`Error::UnknownCompression`] for codecs without a payload
/// decoder (including deleted records), or the codec's own error.
pub fn decompress(data: &[u8], codec: Codec, size_decompressed: usize) -> Result<Vec<u8>> {
    match codec {
        Codec::Uncompressed => Ok(data.to_vec()),
        Codec::RefPack | Codec::RefPackStreamable => refpack::decompress(data),
        Codec::Deflate => deflate::decompress(data, size_decompressed),
        Codec::Deleted | Codec::Unknown(_) => Err(Error::UnknownCompression { codec: codec.id() }),
    }
}
