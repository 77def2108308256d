//! Stream mixing and master volume
//!
//! The [`StreamMixer`] owns one lane per chip: the chip itself, its
//! [`RateAdapter`](crate::resampler::RateAdapter), a hold register with the
//! last generated frame, and a per-chip calibration gain. Per output frame
//! each lane runs its chip for however many native ticks elapsed (zero ticks
//! holds the previous frame, the nearest-neighbor behavior of the hardware
//! players) and the scaled results are summed into one stereo f32 frame.

use crate::chips::SoundChip;
use crate::resampler::RateAdapter;

/// Baseline attenuation that maps raw chip accumulator units into f32
/// sample range at volume modifier 0.
const MASTER_ATTENUATION: f32 = 0.00005;

/// Converts the VGM header volume-modifier byte into a linear gain.
///
/// The byte is a signed 7.something oddity: values above 192 wrap to the
/// negative range, and the resulting exponent is applied as 2^(v/64) around
/// the baseline attenuation.
pub fn master_volume(volume_mod: u8) -> f32 {
    let mut v = volume_mod as i32;
    if v > 192 {
        v = v - 192 - 63;
    }
    if v == -63 {
        v -= 1;
    }
    (v as f32 / 64.0).exp2() * MASTER_ATTENUATION
}

/// Handle to a chip lane inside a [`StreamMixer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipId(usize);

struct ChipLane {
    chip: Box<dyn SoundChip>,
    adapter: RateAdapter,
    /// Calibration gain relative to the other chips in the mix.
    gain: f32,
    /// Last generated frame, held between native ticks.
    last_out: (i32, i32),
}

/// Mixes any number of rate-adapted chips into one stereo f32 stream.
pub struct StreamMixer {
    lanes: Vec<ChipLane>,
    master_volume: f32,
}

impl StreamMixer {
    /// Creates an empty mixer with the given master volume.
    pub fn new(master_volume: f32) -> Self {
        Self {
            lanes: Vec::new(),
            master_volume,
        }
    }

    /// Adds a chip lane and returns its handle.
    pub fn add_chip(
        &mut self,
        chip: Box<dyn SoundChip>,
        adapter: RateAdapter,
        gain: f32,
    ) -> ChipId {
        self.lanes.push(ChipLane {
            chip,
            adapter,
            gain,
            last_out: (0, 0),
        });
        ChipId(self.lanes.len() - 1)
    }

    /// Number of chip lanes.
    pub fn chip_count(&self) -> usize {
        self.lanes.len()
    }

    /// Replaces the master volume for subsequent frames.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume;
    }

    /// Forwards a register write to a lane's chip. Unknown handles are ignored.
    pub fn write_register(&mut self, id: ChipId, addr: u8, data: u8) {
        if let Some(lane) = self.lanes.get_mut(id.0) {
            lane.chip.write_register(addr, data);
        }
    }

    /// Forwards a sample-memory write to a lane's chip.
    pub fn write_memory(&mut self, id: ChipId, addr: u32, data: u8) {
        if let Some(lane) = self.lanes.get_mut(id.0) {
            lane.chip.write_memory(addr, data);
        }
    }

    /// Loads a block into a lane's sample memory.
    pub fn load_memory(&mut self, id: ChipId, start: u32, data: &[u8]) {
        if let Some(lane) = self.lanes.get_mut(id.0) {
            lane.chip.load_memory(start, data);
        }
    }

    /// Produces the next output frame.
    pub fn next_frame(&mut self) -> (f32, f32) {
        let mut left = 0.0f32;
        let mut right = 0.0f32;
        for lane in self.lanes.iter_mut() {
            for _ in 0..lane.adapter.ticks_for_frame() {
                lane.last_out = lane.chip.generate();
            }
            let scale = lane.gain * self.master_volume;
            left += lane.last_out.0 as f32 * scale;
            right += lane.last_out.1 as f32 * scale;
        }
        (left, right)
    }

    /// Resets every lane: chip state, adapter phase and hold registers.
    pub fn reset(&mut self) {
        for lane in self.lanes.iter_mut() {
            lane.chip.reset();
            lane.adapter.reset();
            lane.last_out = (0, 0);
        }
    }
}
