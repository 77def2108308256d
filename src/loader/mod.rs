//! VGM file loading
//!
//! Reads a `.vgm` or `.vgz` file from disk, transparently decompresses it
//! and verifies the magic, returning the raw command-stream bytes ready for
//! [`VgmHeader::parse`](crate::vgm::VgmHeader::parse) or
//! [`load_song`](crate::player::load_song).

use crate::compression::decompress_if_needed;
use crate::vgm::VGM_MAGIC;
use crate::{Result, VgmError};
use std::fs;
use std::path::Path;

/// Loads VGM data from the filesystem.
pub struct VgmFileLoader;

impl VgmFileLoader {
    /// Reads and decompresses a VGM file.
    ///
    /// Detection is content-based: a gzip stream is inflated regardless of
    /// extension, then the result must start with the VGM magic.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        let raw = fs::read(path.as_ref())?;
        let data = decompress_if_needed(&raw)?;
        if data.len() < 4 || &data[0..4] != VGM_MAGIC {
            return Err(VgmError::ParseError(format!(
                "{} is not a VGM file",
                path.as_ref().display()
            )));
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("vgmplay-loader-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_load_plain_file() {
        let path = temp_path("plain.vgm");
        fs::write(&path, b"Vgm payload").unwrap();
        let data = VgmFileLoader::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(data, b"Vgm payload");
    }

    #[test]
    fn test_load_gzipped_file() {
        let path = temp_path("packed.vgz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"Vgm payload").unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();
        let data = VgmFileLoader::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(data, b"Vgm payload");
    }

    #[test]
    fn test_rejects_non_vgm_content() {
        let path = temp_path("other.bin");
        fs::write(&path, b"RIFF....").unwrap();
        let result = VgmFileLoader::load(&path);
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = VgmFileLoader::load("/nonexistent/file.vgm").unwrap_err();
        assert!(matches!(err, VgmError::Io(_)));
    }
}
