//! PCM sound chip emulation
//!
//! The [`SoundChip`] trait is the seam between the chip emulators and the
//! mixing/playback layers: register writes and sample memory go in, one
//! stereo frame per native clock tick comes out.

pub mod ga20;
pub mod rf5c68;

pub use ga20::Ga20;
pub use rf5c68::Rf5c68;

/// Common interface for emulated PCM sound chips.
///
/// A chip owns its voice state and sample memory. `generate` advances every
/// active voice by exactly one native sample period; callers that need a
/// different output rate wrap the chip in a
/// [`RateAdapter`](crate::resampler::RateAdapter).
pub trait SoundChip: Send {
    /// Resets all voices, banks and sample memory to power-on state.
    fn reset(&mut self);

    /// Writes one byte to a chip register.
    ///
    /// Unmapped register addresses are ignored, as on hardware.
    fn write_register(&mut self, addr: u8, data: u8);

    /// Writes one byte into the chip's sample memory.
    ///
    /// Addresses outside the memory are handled per chip (wrapped or
    /// ignored); the write never fails.
    fn write_memory(&mut self, addr: u32, data: u8);

    /// Generates one stereo frame at the chip's native rate.
    ///
    /// Returns raw accumulator values; scaling to the output range is the
    /// mixer's job.
    fn generate(&mut self) -> (i32, i32);

    /// Copies a block into sample memory starting at `start`.
    fn load_memory(&mut self, start: u32, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.write_memory(start.wrapping_add(i as u32), byte);
        }
    }
}
