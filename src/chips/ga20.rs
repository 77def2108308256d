//! Irem GA20 PCM sampler
//!
//! 4-voice mono sampler addressing up to 1 MB of sample ROM, used on Irem
//! arcade boards (M92/M107). Voices step through ROM with a 8.12 fixed-point
//! position; samples are unsigned 8-bit centered on 0x80 and the byte value
//! 0x00 is the end-of-sample sentinel. Volume and rate registers go through
//! non-linear hardware laws before they reach the voice.

use crate::chips::SoundChip;

/// Number of PCM voices.
pub const NUM_VOICES: usize = 4;
/// Native sample rate divider: one frame every 64 clock cycles.
pub const CLOCK_DIVIDER: u32 = 64;

const ROM_LEN: usize = 1 << 20;
/// Fractional bits of the per-voice position accumulator.
const ADDR_FRAC_BITS: u32 = 12;
/// The 16-bit start register holds bits 4..=19 of the byte address.
const START_SHIFT: u32 = 4;
/// End-of-sample marker byte in ROM.
const SAMPLE_END: u8 = 0x00;
/// Unsigned samples are centered on this value.
const SAMPLE_BIAS: i32 = 0x80;

/// One PCM voice.
#[derive(Debug, Clone, Copy, Default)]
struct Voice {
    enabled: bool,
    /// Current position, 8.12 fixed point over the byte address.
    pos: u32,
    /// Latched start register; armed into `pos` on trigger.
    start: u16,
    /// Per-frame position increment. Register value 0xFF yields the full
    /// 1 << 16, which needs more than 16 bits.
    rate: u32,
    /// Post-law volume, 0..=246.
    volume: u8,
}

/// GA20 PCM sampler emulator.
pub struct Ga20 {
    voices: [Voice; NUM_VOICES],
    rom: Box<[u8]>,
}

impl Ga20 {
    /// Creates a chip in power-on state: all voices idle, ROM cleared.
    pub fn new() -> Self {
        Self {
            voices: [Voice::default(); NUM_VOICES],
            rom: vec![0u8; ROM_LEN].into_boxed_slice(),
        }
    }

    /// Native sample rate for a given master clock.
    pub fn sample_rate(clock: u32) -> u32 {
        clock / CLOCK_DIVIDER
    }

    /// Hardware volume law: compresses the register range into 0..=246.
    fn volume_law(data: u8) -> u8 {
        ((data as u32 * 256) / (data as u32 + 10)) as u8
    }

    /// Hardware rate law: register value v plays at (1 << 16) / (0x100 - v)
    /// position units per frame, so 0xF0 is unit rate (one ROM byte per frame).
    fn rate_law(data: u8) -> u32 {
        (1u32 << 16) / (0x100 - data as u32)
    }
}

impl Default for Ga20 {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundChip for Ga20 {
    fn reset(&mut self) {
        self.voices = [Voice::default(); NUM_VOICES];
        self.rom.fill(0);
    }

    fn write_register(&mut self, addr: u8, data: u8) {
        let voice = &mut self.voices[((addr >> 3) & 3) as usize];
        match addr & 7 {
            0 => voice.start = (voice.start & 0xFF00) | data as u16,
            1 => voice.start = (voice.start & 0x00FF) | ((data as u16) << 8),
            4 => voice.rate = Self::rate_law(data),
            5 => voice.volume = Self::volume_law(data),
            6 => {
                // Trigger: arm the latched start address and key the voice on.
                voice.pos = (voice.start as u32) << (START_SHIFT + ADDR_FRAC_BITS);
                voice.enabled = true;
            }
            _ => {}
        }
    }

    fn write_memory(&mut self, addr: u32, data: u8) {
        if let Some(slot) = self.rom.get_mut(addr as usize) {
            *slot = data;
        }
    }

    fn generate(&mut self) -> (i32, i32) {
        let mut acc = 0i32;
        for voice in self.voices.iter_mut() {
            if !voice.enabled {
                continue;
            }
            let sample = self.rom[((voice.pos >> ADDR_FRAC_BITS) as usize) & (ROM_LEN - 1)];
            if sample == SAMPLE_END {
                voice.enabled = false;
                continue;
            }
            acc += (sample as i32 - SAMPLE_BIAS) * voice.volume as i32;
            voice.pos = voice.pos.wrapping_add(voice.rate);
        }
        // Mono chip: the same quarter-scaled mix feeds both sides.
        (acc / 4, acc / 4)
    }
}
