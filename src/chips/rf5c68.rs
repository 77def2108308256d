//! Ricoh RF5C68 PCM sampler
//!
//! 8-voice sampler with 64 KB of wave RAM, as found in the Sega CD and the
//! FM Towns. Each voice walks wave RAM with a 16.11 fixed-point address
//! accumulator; samples are stored sign-magnitude (bit 7 set = positive)
//! and the byte value 0xFF is an end-of-sample sentinel that redirects the
//! voice to its loop address. Register decode is banked: the control
//! register selects which voice the per-voice registers address.

use crate::chips::SoundChip;
use bitflags::bitflags;

/// Number of PCM voices.
pub const NUM_CHANNELS: usize = 8;
/// Native sample rate divider: one frame every 384 clock cycles.
pub const CLOCK_DIVIDER: u32 = 384;

const WAVE_RAM_LEN: usize = 1 << 16;
/// Fractional bits of the per-voice address accumulator.
const ADDR_FRAC_BITS: u32 = 11;
/// The start register holds the top 8 bits (page) of the 16-bit byte address.
const START_PAGE_BITS: u32 = 8;
/// End-of-sample marker byte in wave RAM.
const SAMPLE_END: u8 = 0xFF;
/// 7-bit magnitude * (4-bit pan * 8-bit envelope) >> 5 keeps the
/// accumulator near 14 bits per voice, matching the hardware mix level.
const OUTPUT_SHIFT: u32 = 5;

bitflags! {
    /// Control register (0x07) bit layout.
    struct ControlFlags: u8 {
        /// Global chip enable; when clear the chip outputs silence.
        const SOUNDING = 0x80;
        /// Selects whether the low bits set the channel bank or the wave bank.
        const CHANNEL_BANK_MODE = 0x40;
    }
}

/// One PCM voice.
#[derive(Debug, Clone, Copy, Default)]
struct Channel {
    enabled: bool,
    /// Envelope (volume) level, 0..=255.
    env: u8,
    /// Pan: low nibble = left level, high nibble = right level.
    pan: u8,
    /// Start page of the sample.
    start: u8,
    /// Current position, 16.11 fixed point over the byte address.
    addr: u32,
    /// Per-frame address increment, 5.11 fixed point.
    step: u16,
    /// Loop target byte address.
    loop_start: u16,
}

impl Channel {
    fn armed_addr(&self) -> u32 {
        (self.start as u32) << (START_PAGE_BITS + ADDR_FRAC_BITS)
    }
}

/// RF5C68 PCM sampler emulator.
pub struct Rf5c68 {
    channels: [Channel; NUM_CHANNELS],
    /// Voice addressed by the per-voice registers (0x00..=0x06).
    channel_bank: usize,
    /// 4 KB wave RAM window selected for CPU access. Tracked for register
    /// fidelity; sample uploads arrive with absolute addresses.
    #[allow(dead_code)]
    write_bank: u8,
    enabled: bool,
    wave_ram: Box<[u8]>,
}

impl Rf5c68 {
    /// Creates a chip in power-on state: disabled, wave RAM cleared.
    pub fn new() -> Self {
        Self {
            channels: [Channel::default(); NUM_CHANNELS],
            channel_bank: 0,
            write_bank: 0,
            enabled: false,
            wave_ram: vec![0u8; WAVE_RAM_LEN].into_boxed_slice(),
        }
    }

    /// Native sample rate for a given master clock.
    pub fn sample_rate(clock: u32) -> u32 {
        clock / CLOCK_DIVIDER
    }

    fn read_ram(&self, addr: u32) -> u8 {
        self.wave_ram[((addr >> ADDR_FRAC_BITS) as usize) & (WAVE_RAM_LEN - 1)]
    }
}

impl Default for Rf5c68 {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundChip for Rf5c68 {
    fn reset(&mut self) {
        self.channels = [Channel::default(); NUM_CHANNELS];
        self.channel_bank = 0;
        self.write_bank = 0;
        self.enabled = false;
        self.wave_ram.fill(0);
    }

    fn write_register(&mut self, addr: u8, data: u8) {
        match addr {
            0x00..=0x06 => {
                let chan = &mut self.channels[self.channel_bank];
                match addr {
                    0x00 => chan.env = data,
                    0x01 => chan.pan = data,
                    0x02 => chan.step = (chan.step & 0xFF00) | data as u16,
                    0x03 => chan.step = (chan.step & 0x00FF) | ((data as u16) << 8),
                    0x04 => chan.loop_start = (chan.loop_start & 0xFF00) | data as u16,
                    0x05 => chan.loop_start = (chan.loop_start & 0x00FF) | ((data as u16) << 8),
                    0x06 => {
                        // A playing voice keeps its position; the new start
                        // takes effect on the next key-on.
                        chan.start = data;
                        if !chan.enabled {
                            chan.addr = chan.armed_addr();
                        }
                    }
                    _ => unreachable!(),
                }
            }
            0x07 => {
                let ctrl = ControlFlags::from_bits_truncate(data);
                self.enabled = ctrl.contains(ControlFlags::SOUNDING);
                if ctrl.contains(ControlFlags::CHANNEL_BANK_MODE) {
                    self.channel_bank = (data & 0x07) as usize;
                } else {
                    self.write_bank = data & 0x0F;
                }
            }
            0x08 => {
                // Active-low key mask: bit clear = voice on.
                for (i, chan) in self.channels.iter_mut().enumerate() {
                    chan.enabled = (!data >> i) & 1 != 0;
                    if !chan.enabled {
                        chan.addr = chan.armed_addr();
                    }
                }
            }
            _ => {}
        }
    }

    fn write_memory(&mut self, addr: u32, data: u8) {
        self.wave_ram[addr as usize & (WAVE_RAM_LEN - 1)] = data;
    }

    fn generate(&mut self) -> (i32, i32) {
        if !self.enabled {
            return (0, 0);
        }
        let mut left = 0i32;
        let mut right = 0i32;
        for i in 0..NUM_CHANNELS {
            if !self.channels[i].enabled {
                continue;
            }
            let mut sample = self.read_ram(self.channels[i].addr);
            if sample == SAMPLE_END {
                let chan = &mut self.channels[i];
                chan.addr = (chan.loop_start as u32) << ADDR_FRAC_BITS;
                sample = self.read_ram(self.channels[i].addr);
                if sample == SAMPLE_END {
                    // Loop target is itself an end marker: nothing to play,
                    // key the voice off. The others still sound this frame.
                    self.channels[i].enabled = false;
                    continue;
                }
            }
            let chan = &mut self.channels[i];
            chan.addr = chan.addr.wrapping_add(chan.step as u32);

            let left_level = (chan.pan & 0x0F) as i32 * chan.env as i32;
            let right_level = (chan.pan >> 4) as i32 * chan.env as i32;
            if sample & 0x80 != 0 {
                let magnitude = (sample & 0x7F) as i32;
                left += (magnitude * left_level) >> OUTPUT_SHIFT;
                right += (magnitude * right_level) >> OUTPUT_SHIFT;
            } else {
                let magnitude = sample as i32;
                left -= (magnitude * left_level) >> OUTPUT_SHIFT;
                right -= (magnitude * right_level) >> OUTPUT_SHIFT;
            }
        }
        (left, right)
    }
}
