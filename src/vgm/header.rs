//! VGM file header

use crate::{Result, VgmError};

/// File magic, "Vgm " in ASCII.
pub const VGM_MAGIC: &[u8; 4] = b"Vgm ";

/// Oldest supported format revision (BCD). 1.51 introduced the relative
/// data offset this parser relies on.
const MIN_VERSION: u32 = 0x151;

/// Full header size through version 1.71. Shorter files cannot carry the
/// fields this player reads.
const HEADER_LEN: usize = 0x100;

/// Parsed VGM header fields.
///
/// Only the fields this player acts on are kept; everything else in the
/// 256-byte header is skipped during parsing. The raw relative offsets are
/// preserved as stored; use the accessor methods for absolute positions.
#[derive(Debug, Clone, Default)]
pub struct VgmHeader {
    /// Format revision in BCD, e.g. 0x171 for version 1.71.
    pub version: u32,
    /// Relative offset (from 0x14) of the GD3 tag, 0 if absent.
    pub gd3_offset: u32,
    /// Total length of the song in 44100 Hz wait samples.
    pub total_samples: u32,
    /// Relative offset (from 0x1C) of the loop point, 0 if the song does not loop.
    pub loop_offset: u32,
    /// Number of wait samples in the looped part.
    pub loop_samples: u32,
    /// Relative offset (from 0x34) of the first command.
    pub data_offset: u32,
    /// RF5C68 master clock in Hz, 0 if the chip is unused.
    pub rf5c68_clock: u32,
    /// Volume modifier byte (v1.60+), fed to [`master_volume`](crate::mixer::master_volume).
    pub volume_mod: u8,
    /// Loop base (v1.60+).
    pub loop_base: u8,
    /// Loop modifier (v1.60+).
    pub loop_mod: u8,
    /// GA20 master clock in Hz (v1.71+), 0 if the chip is unused.
    pub ga20_clock: u32,
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

impl VgmHeader {
    /// Parses a header from the start of `data`.
    ///
    /// `data` must be decompressed; see
    /// [`decompress_if_needed`](crate::compression::decompress_if_needed).
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(VgmError::ParseError(format!(
                "file too small for a VGM header: {} bytes",
                data.len()
            )));
        }
        if &data[0..4] != VGM_MAGIC {
            return Err(VgmError::ParseError("wrong magic, not a VGM file".into()));
        }

        let version = read_u32(data, 0x08);
        if version < MIN_VERSION {
            return Err(VgmError::ParseError(format!(
                "VGM version {} too old (need 1.51+)",
                format_version(version)
            )));
        }

        let mut header = VgmHeader {
            version,
            gd3_offset: read_u32(data, 0x14),
            total_samples: read_u32(data, 0x18),
            loop_offset: read_u32(data, 0x1C),
            loop_samples: read_u32(data, 0x20),
            data_offset: read_u32(data, 0x34),
            rf5c68_clock: read_u32(data, 0x40),
            volume_mod: data[0x7C],
            loop_base: data[0x7E],
            loop_mod: data[0x7F],
            ga20_clock: 0,
        };
        // The GA20 clock slot only exists from 1.71 on.
        if version >= 0x171 {
            header.ga20_clock = read_u32(data, 0xE0);
        }

        let data_start = header.data_start();
        if data_start < 0x40 || data_start >= data.len() {
            return Err(VgmError::ParseError(format!(
                "data offset 0x{:X} outside the file",
                data_start
            )));
        }

        Ok(header)
    }

    /// Absolute offset of the first command.
    pub fn data_start(&self) -> usize {
        0x34 + self.data_offset as usize
    }

    /// Absolute offset of the loop point, if the song loops.
    pub fn loop_start(&self) -> Option<usize> {
        (self.loop_offset != 0).then(|| 0x1C + self.loop_offset as usize)
    }

    /// Absolute offset of the GD3 tag, if present.
    pub fn gd3_start(&self) -> Option<usize> {
        (self.gd3_offset != 0).then(|| 0x14 + self.gd3_offset as usize)
    }

    /// Human-readable format revision, e.g. "1.71".
    pub fn version_string(&self) -> String {
        format_version(self.version)
    }
}

fn format_version(version: u32) -> String {
    format!("{:x}.{:02x}", version >> 8, version & 0xFF)
}
