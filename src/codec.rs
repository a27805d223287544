//! Self-describing compression codec for stored payloads.
//!
//! Values above the configured threshold are compressed and prefixed with a
//! 4-byte envelope naming the codec that produced them. Decoding dispatches
//! on the envelope, never on configuration, so the algorithm can change at
//! any time without a data migration: values written under an older
//! algorithm (or before compression was enabled at all) stay readable.

use crate::error::{Error, Result};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// Length of the envelope prefix identifying the codec.
pub const PREFIX_LEN: usize = 4;

const PREFIX_GZIP: &[u8; PREFIX_LEN] = b":gz:";
const PREFIX_SNAPPY: &[u8; PREFIX_LEN] = b":sn:";
const PREFIX_ZSTD: &[u8; PREFIX_LEN] = b":zs:";
const PREFIX_LZ4: &[u8; PREFIX_LEN] = b":l4:";

/// zstd level 3 is fast with good compression.
const ZSTD_LEVEL: i32 = 3;

/// Compression algorithm selected at write time.
///
/// Readers never consult this: [`decode`] dispatches on the envelope prefix
/// alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionAlgorithm {
    /// Store payloads uncompressed.
    None,
    /// zlib stream at the fastest level (the legacy gzip-compatible codec).
    Gzip,
    /// Snappy raw block.
    Snappy,
    /// zstd frame.
    Zstd,
    /// LZ4 block with a length header.
    Lz4,
}

impl CompressionAlgorithm {
    /// Envelope prefix written ahead of compressed payloads, or `None` for
    /// the uncompressed algorithm.
    pub fn prefix(self) -> Option<&'static [u8; PREFIX_LEN]> {
        match self {
            CompressionAlgorithm::None => Option::None,
            CompressionAlgorithm::Gzip => Some(PREFIX_GZIP),
            CompressionAlgorithm::Snappy => Some(PREFIX_SNAPPY),
            CompressionAlgorithm::Zstd => Some(PREFIX_ZSTD),
            CompressionAlgorithm::Lz4 => Some(PREFIX_LZ4),
        }
    }

    /// Configuration spelling of the algorithm.
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionAlgorithm::None => "none",
            CompressionAlgorithm::Gzip => "gzip",
            CompressionAlgorithm::Snappy => "snappy",
            CompressionAlgorithm::Zstd => "zstd",
            CompressionAlgorithm::Lz4 => "lz4",
        }
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CompressionAlgorithm::None),
            "gzip" => Ok(CompressionAlgorithm::Gzip),
            "snappy" => Ok(CompressionAlgorithm::Snappy),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            other => Err(Error::ConfigError(format!(
                "Unknown compression algorithm: {}",
                other
            ))),
        }
    }
}

/// Encode a payload for storage.
///
/// Returns the input unchanged when the algorithm is `None`, the threshold
/// is zero, or the payload is shorter than the threshold; the three
/// conditions are independent and the length comparison is inclusive
/// (`len >= threshold` compresses). On compressor failure a warning is
/// logged and the original bytes are returned unprefixed; data is never
/// silently corrupted.
pub fn encode(data: &[u8], threshold: usize, algorithm: CompressionAlgorithm) -> Vec<u8> {
    let prefix = match algorithm.prefix() {
        Some(prefix) => prefix,
        None => return data.to_vec(),
    };
    if threshold == 0 || data.len() < threshold {
        return data.to_vec();
    }

    debug!("Compressing {} bytes with {}", data.len(), algorithm);
    match compress(data, algorithm) {
        Ok(compressed) => {
            let mut out = Vec::with_capacity(PREFIX_LEN + compressed.len());
            out.extend_from_slice(prefix);
            out.extend_from_slice(&compressed);
            debug!(
                "Data compressed by {:.1} percent",
                100.0 - (out.len() as f64 / data.len() as f64 * 100.0)
            );
            out
        }
        Err(e) => {
            warn!("Could not compress data using {}: {}", algorithm, e);
            data.to_vec()
        }
    }
}

/// Decode a stored payload.
///
/// The first four bytes name the codec that produced the value; a
/// recognized prefix is stripped and inverted. Anything else (including
/// inputs shorter than the prefix) is returned unchanged, treated as
/// already-plain data.
///
/// # Errors
///
/// `Error::CodecError` when a recognized prefix carries bytes the codec
/// cannot invert.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < PREFIX_LEN {
        return Ok(data.to_vec());
    }

    let (prefix, body) = data.split_at(PREFIX_LEN);
    if prefix == PREFIX_GZIP {
        let mut decoder = flate2::read::ZlibDecoder::new(body);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| Error::CodecError(format!("zlib decompression failed: {}", e)))?;
        Ok(out)
    } else if prefix == PREFIX_SNAPPY {
        snap::raw::Decoder::new()
            .decompress_vec(body)
            .map_err(|e| Error::CodecError(format!("snappy decompression failed: {}", e)))
    } else if prefix == PREFIX_ZSTD {
        zstd::stream::decode_all(body)
            .map_err(|e| Error::CodecError(format!("zstd decompression failed: {}", e)))
    } else if prefix == PREFIX_LZ4 {
        lz4_flex::decompress_size_prepended(body)
            .map_err(|e| Error::CodecError(format!("lz4 decompression failed: {}", e)))
    } else {
        Ok(data.to_vec())
    }
}

fn compress(
    data: &[u8],
    algorithm: CompressionAlgorithm,
) -> std::result::Result<Vec<u8>, String> {
    match algorithm {
        CompressionAlgorithm::None => Ok(data.to_vec()),
        CompressionAlgorithm::Gzip => {
            let mut encoder =
                flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
            encoder.write_all(data).map_err(|e| e.to_string())?;
            encoder.finish().map_err(|e| e.to_string())
        }
        CompressionAlgorithm::Snappy => snap::raw::Encoder::new()
            .compress_vec(data)
            .map_err(|e| e.to_string()),
        CompressionAlgorithm::Zstd => {
            zstd::stream::encode_all(data, ZSTD_LEVEL).map_err(|e| e.to_string())
        }
        CompressionAlgorithm::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
    }
}
