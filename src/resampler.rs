//! Chip-clock to output-rate adaptation
//!
//! Chips produce one frame every `CLOCK_DIVIDER` master-clock cycles; the
//! output stream runs at an unrelated rate (typically 44100 Hz). The
//! [`RateAdapter`] answers, per output frame, how many native chip frames
//! have elapsed. The accumulation is exact integer arithmetic over
//! clock / (divider * output_rate), so the tick count never drifts from the
//! true rational ratio no matter how long playback runs.

use crate::{Result, VgmError};

/// Exact rational rate converter from a chip clock to an output rate.
///
/// Each call to [`ticks_for_frame`](Self::ticks_for_frame) advances one
/// output frame and returns the number of whole native frames that fit,
/// carrying the remainder to the next call.
#[derive(Debug, Clone)]
pub struct RateAdapter {
    clock: u64,
    divider: u64,
    output_rate: u64,
    /// Remainder accumulator in clock-cycle units, always < divider * output_rate.
    acc: u64,
}

impl RateAdapter {
    /// Creates an adapter for a chip running at `clock` Hz with the given
    /// cycles-per-frame divider, producing frames at `output_rate` Hz.
    pub fn new(clock: u32, divider: u32, output_rate: u32) -> Result<Self> {
        if clock == 0 || divider == 0 || output_rate == 0 {
            return Err(VgmError::ConfigError(format!(
                "rate adapter needs non-zero clock/divider/rate (got {}/{}/{})",
                clock, divider, output_rate
            )));
        }
        Ok(Self {
            clock: clock as u64,
            divider: divider as u64,
            output_rate: output_rate as u64,
            acc: 0,
        })
    }

    /// Advances one output frame and returns the native tick count for it.
    pub fn ticks_for_frame(&mut self) -> u32 {
        self.acc += self.clock;
        let frame_units = self.divider * self.output_rate;
        let ticks = self.acc / frame_units;
        self.acc -= ticks * frame_units;
        ticks as u32
    }

    /// The chip's native frame rate in Hz.
    pub fn native_rate(&self) -> f64 {
        self.clock as f64 / self.divider as f64
    }

    /// Clears the carried remainder.
    pub fn reset(&mut self) {
        self.acc = 0;
    }
}
