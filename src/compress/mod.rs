// src/compress/mod.rs

//! Compressed resource payloads.
//!
//! [`decompress`] and [`compress`] work on whole resource blobs, extended
//! header included, and dispatch on [`CompressionFormat`].

pub mod ext_header;
pub mod gregg_table;
pub mod greggy_bits;
pub mod masked_words;

pub use ext_header::{CompressionFormat, classify};
pub use greggy_bits::{GreggParams, RunLayout, TableChoice};

use crate::utils::error::{ResourceError, Result};
use ext_header::{ExtHeader, GENERIC_HEADER_SIZE};
use std::io::Cursor;

/// Expands a resource blob according to its extended header.
///
/// Blobs the sniffer does not recognise come back unchanged; DonnBits
/// blobs are an error.
pub fn decompress(blob: &[u8]) -> Result<Vec<u8>> {
    match classify(blob) {
        CompressionFormat::GreggyBits => {
            let header = ExtHeader::read(&mut Cursor::new(blob))?;
            greggy_bits::decompress(&blob[GENERIC_HEADER_SIZE..], header.unpacked_len as usize)
        }
        CompressionFormat::DonnBits => Err(ResourceError::Unimplemented("DonnBits decompression")),
        CompressionFormat::UnknownCompression => Ok(blob.to_vec()),
    }
}

/// Compresses `data` into a complete blob in `format`, with default encoder
/// parameters.
pub fn compress(data: &[u8], format: CompressionFormat) -> Result<Vec<u8>> {
    compress_with(data, format, &GreggParams::default())
}

/// Like [`compress`], with explicit GreggyBits parameters.
pub fn compress_with(data: &[u8], format: CompressionFormat, params: &GreggParams) -> Result<Vec<u8>> {
    match format {
        CompressionFormat::GreggyBits => {
            let unpacked_len = u32::try_from(data.len()).map_err(|_| ResourceError::OffsetOverflow {
                what: "uncompressed length",
                value: data.len(),
            })?;
            let body = greggy_bits::compress(data, params)?;

            let mut blob = Vec::with_capacity(GENERIC_HEADER_SIZE + body.len());
            ExtHeader::for_gregg(unpacked_len).write(&mut blob)?;
            blob.extend_from_slice(&body);
            Ok(blob)
        }
        CompressionFormat::DonnBits => Err(ResourceError::Unimplemented("DonnBits compression")),
        CompressionFormat::UnknownCompression => Ok(data.to_vec()),
    }
}
