//! GD3 metadata tag
//!
//! The GD3 block trails the command stream and carries track/game/system
//! names (each in an English and a Japanese variant), author, release date,
//! ripper and notes as UTF-16LE strings, each terminated by a 16-bit zero.

use crate::{Result, VgmError};

const GD3_MAGIC: &[u8; 4] = b"Gd3 ";
const NUM_FIELDS: usize = 11;

/// Decoded GD3 song metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gd3Tag {
    /// Track name.
    pub track_name: String,
    /// Track name, Japanese.
    pub track_name_jp: String,
    /// Game name.
    pub game_name: String,
    /// Game name, Japanese.
    pub game_name_jp: String,
    /// System name.
    pub system_name: String,
    /// System name, Japanese.
    pub system_name_jp: String,
    /// Original composer.
    pub author: String,
    /// Original composer, Japanese.
    pub author_jp: String,
    /// Release date.
    pub date: String,
    /// Person who created the VGM file.
    pub ripper: String,
    /// Free-form notes.
    pub notes: String,
}

impl Gd3Tag {
    /// Parses a GD3 tag starting at the beginning of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 12 {
            return Err(VgmError::ParseError("GD3 tag truncated".into()));
        }
        if &data[0..4] != GD3_MAGIC {
            return Err(VgmError::ParseError("wrong GD3 magic".into()));
        }
        let length = u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize;
        let payload = data
            .get(12..12 + length)
            .ok_or_else(|| VgmError::ParseError("GD3 payload runs past end of file".into()))?;

        let mut offset = 0usize;
        let mut fields = [(); NUM_FIELDS].map(|_| String::new());
        for field in fields.iter_mut() {
            *field = read_utf16_string(payload, &mut offset)?;
        }
        let [track_name, track_name_jp, game_name, game_name_jp, system_name, system_name_jp, author, author_jp, date, ripper, notes] =
            fields;

        Ok(Gd3Tag {
            track_name,
            track_name_jp,
            game_name,
            game_name_jp,
            system_name,
            system_name_jp,
            author,
            author_jp,
            date,
            ripper,
            notes,
        })
    }
}

/// Reads one zero-terminated UTF-16LE string, advancing `offset` past the
/// terminator.
fn read_utf16_string(data: &[u8], offset: &mut usize) -> Result<String> {
    let mut units = Vec::new();
    loop {
        let bytes = data
            .get(*offset..*offset + 2)
            .ok_or_else(|| VgmError::ParseError("unterminated GD3 string".into()))?;
        *offset += 2;
        let unit = u16::from_le_bytes([bytes[0], bytes[1]]);
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    Ok(String::from_utf16_lossy(&units))
}
