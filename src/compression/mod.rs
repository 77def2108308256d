//! Transparent gzip decompression for `.vgz` files
//!
//! VGM files are commonly shipped gzip-compressed with a `.vgz` extension.
//! Detection goes by content (the gzip magic bytes), not by file name, so a
//! compressed file with a `.vgm` extension still loads.

use crate::{Result, VgmError};
use flate2::read::GzDecoder;
use std::io::Read;

/// Gzip stream magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Cap on decompressed size. The largest real VGM logs are a few tens of
/// megabytes; anything past this is a corrupt or hostile stream.
const MAX_DECOMPRESSED_SIZE: u64 = 64 * 1024 * 1024;

/// Returns true if `data` starts with a gzip stream header.
pub fn is_gzip_compressed(data: &[u8]) -> bool {
    data.len() >= 2 && data[0..2] == GZIP_MAGIC
}

/// Decompresses `data` if it is gzip-compressed, otherwise returns it as-is.
pub fn decompress_if_needed(data: &[u8]) -> Result<Vec<u8>> {
    if !is_gzip_compressed(data) {
        return Ok(data.to_vec());
    }

    let mut decompressed = Vec::new();
    let mut decoder = GzDecoder::new(data).take(MAX_DECOMPRESSED_SIZE + 1);
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| VgmError::DecompressionError(format!("gzip stream error: {}", e)))?;

    if decompressed.len() as u64 > MAX_DECOMPRESSED_SIZE {
        return Err(VgmError::DecompressionError(format!(
            "decompressed size exceeds {} byte limit",
            MAX_DECOMPRESSED_SIZE
        )));
    }

    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_detects_gzip_magic() {
        assert!(is_gzip_compressed(&[0x1F, 0x8B, 0x08]));
        assert!(!is_gzip_compressed(b"Vgm "));
        assert!(!is_gzip_compressed(&[0x1F]));
        assert!(!is_gzip_compressed(&[]));
    }

    #[test]
    fn test_uncompressed_data_passes_through() {
        let data = b"Vgm not actually compressed";
        assert_eq!(decompress_if_needed(data).unwrap(), data.to_vec());
    }

    #[test]
    fn test_round_trip() {
        let original: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let compressed = gzip(&original);
        assert!(is_gzip_compressed(&compressed));
        assert_eq!(decompress_if_needed(&compressed).unwrap(), original);
    }

    #[test]
    fn test_truncated_stream_is_an_error() {
        let compressed = gzip(b"some vgm payload");
        let truncated = &compressed[..compressed.len() / 2];
        assert!(decompress_if_needed(truncated).is_err());
    }

    #[test]
    fn test_garbage_after_magic_is_an_error() {
        let bogus = [0x1F, 0x8B, 0xFF, 0xFF, 0x00, 0x01, 0x02];
        assert!(decompress_if_needed(&bogus).is_err());
    }
}
