//! VGM container parsing
//!
//! Header field extraction and GD3 metadata decoding for VGM 1.51+ files.
//! All multi-byte fields are little-endian; most offsets in the header are
//! relative to their own field position.

mod gd3;
mod header;

pub use gd3::Gd3Tag;
pub use header::{VgmHeader, VGM_MAGIC};
