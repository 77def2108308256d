//! VGM playback engine for PCM sampler chips
//!
//! Reconstructs the audio stream encoded in a VGM register-write log,
//! sample by sample. The emulated chips are the Ricoh RF5C68 (8-voice PCM
//! sampler, Sega CD / FM Towns) and the Irem GA20 (4-voice PCM sampler from
//! Irem arcade boards). Each chip runs at its native clock and is adapted to
//! the output rate with exact integer accumulators, so phase arithmetic,
//! volume laws and loop semantics reproduce bit-exactly and never drift.
//!
//! Commands addressed to chips that are not modeled (the FM side of mixed
//! soundtracks) are consumed with their documented operand widths so the
//! PCM voices keep correct timing.
//!
//! # Crate feature flags
//! - `emulator` (default): chip emulators (`chips`, `resampler`, `mixer`)
//! - `vgm-format` (default): VGM container parsing (`vgm`, `loader`, `compression`)
//! - `player` (default): command interpreter and playback driver (`player`)
//! - `streaming` (opt-in): real-time audio output (enables optional `rodio` dep)
//! - `export-wav` (opt-in): WAV export of rendered output (enables optional `hound` dep)
//!
//! # Quick start
//! ## Drive a chip directly
//! ```
//! # #[cfg(feature = "emulator")]
//! # {
//! use vgmplay::chips::{Rf5c68, SoundChip};
//! let mut chip = Rf5c68::new();
//! chip.write_register(0x07, 0xC0); // chip enable, select channel bank 0
//! chip.write_register(0x00, 0xFF); // full envelope
//! let (left, right) = chip.generate();
//! # let _ = (left, right);
//! # }
//! ```
//!
//! ## Load and render a VGM file
//! ```no_run
//! use vgmplay::player::PlaybackController;
//! use vgmplay::{load_song, VgmFileLoader};
//! let data = VgmFileLoader::load("song.vgz").unwrap();
//! let (mut player, summary) = load_song(&data).unwrap();
//! player.play().unwrap();
//! let frames = player.generate_samples(summary.total_samples as usize);
//! # let _ = frames;
//! ```
//!
//! ## Real-time streaming
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use vgmplay::player::PlaybackController;
//! use vgmplay::{load_song, AudioDevice, RealtimeStream, StreamConfig, VgmFileLoader};
//! let data = VgmFileLoader::load("song.vgz").unwrap();
//! let (mut player, _summary) = load_song(&data).unwrap();
//! player.play().unwrap();
//! let cfg = StreamConfig::low_latency(44_100);
//! let stream = RealtimeStream::new(cfg).unwrap();
//! let _dev = AudioDevice::new(&cfg, stream.buffer()).unwrap();
//! loop {
//!     let frames = player.generate_samples(2048);
//!     stream.write_blocking(&frames);
//! }
//! # }
//! ```

#![warn(missing_docs)]

// Domain modules (feature-gated for modular use)
#[cfg(feature = "emulator")]
pub mod chips; // PCM chip emulation
#[cfg(feature = "emulator")]
pub mod mixer; // Stream mixing and master volume
#[cfg(feature = "emulator")]
pub mod resampler; // Chip-clock to output-rate adaptation

#[cfg(feature = "vgm-format")]
pub mod compression; // Data decompression (gzip / .vgz)
#[cfg(feature = "vgm-format")]
pub mod loader; // VGM file I/O
#[cfg(feature = "player")]
pub mod player; // Playback engine
#[cfg(feature = "streaming")]
pub mod streaming; // Audio output & streaming
#[cfg(feature = "vgm-format")]
pub mod vgm; // VGM container parsing

#[cfg(feature = "export-wav")]
pub mod export; // WAV export

/// Error types for VGM playback operations
#[derive(thiserror::Error, Debug)]
pub enum VgmError {
    /// Error while parsing the container or the command stream
    #[error("Parse error: {0}")]
    ParseError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Decompression error
    #[error("Decompression error: {0}")]
    DecompressionError(String),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Audio file write error
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for VgmError {
    /// Converts a String into `VgmError::Other`.
    ///
    /// Convenience conversion for generic string errors. For better error
    /// discrimination prefer the specific variant constructors
    /// (`ParseError`, `ConfigError`, ...).
    fn from(msg: String) -> Self {
        VgmError::Other(msg)
    }
}

impl From<&str> for VgmError {
    /// Converts a string slice into `VgmError::Other`.
    fn from(msg: &str) -> Self {
        VgmError::Other(msg.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, VgmError>;

// Public API exports
#[cfg(feature = "emulator")]
pub use chips::{Ga20, Rf5c68, SoundChip};
#[cfg(feature = "emulator")]
pub use mixer::{master_volume, ChipId, StreamMixer};
#[cfg(feature = "emulator")]
pub use resampler::RateAdapter;

#[cfg(feature = "vgm-format")]
pub use compression::decompress_if_needed;
#[cfg(feature = "vgm-format")]
pub use loader::VgmFileLoader;
#[cfg(feature = "player")]
pub use player::{load_song, LoadSummary, PlaybackController, PlaybackState, VgmPlayer};
#[cfg(feature = "streaming")]
pub use streaming::{AudioDevice, RealtimeStream, RingBuffer, StreamConfig};
#[cfg(feature = "vgm-format")]
pub use vgm::{Gd3Tag, VgmHeader};
