//! Real-time audio output
//!
//! A producer thread renders frames out of a [`VgmPlayer`](crate::player::VgmPlayer)
//! into a lock-guarded ring buffer; the audio device pulls from the other
//! end. Memory use is bounded by the ring buffer size regardless of song
//! length.

pub mod audio_device;
pub mod realtime;
pub mod ring_buffer;

pub use audio_device::AudioDevice;
pub use realtime::{RealtimeStream, StreamStats};
pub use ring_buffer::RingBuffer;

/// Default sample rate (44.1 kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Producer backoff while the ring buffer is full, in microseconds
pub const BUFFER_BACKOFF_MICROS: u64 = 100;

/// Configuration for streaming playback
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Ring buffer size in samples (not frames). Larger buffers add latency
    /// but tolerate longer producer stalls.
    pub ring_buffer_size: usize,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of audio channels
    pub channels: u16,
}

impl StreamConfig {
    /// Low-latency preset: 8192 samples ≈ 93ms of stereo @ 44.1kHz
    pub fn low_latency(sample_rate: u32) -> Self {
        StreamConfig {
            ring_buffer_size: 8192,
            sample_rate,
            channels: 2,
        }
    }

    /// Stability preset: 32768 samples ≈ 372ms of stereo @ 44.1kHz
    pub fn stable(sample_rate: u32) -> Self {
        StreamConfig {
            ring_buffer_size: 32768,
            sample_rate,
            channels: 2,
        }
    }

    /// Buffer latency in milliseconds when full
    pub fn latency_ms(&self) -> f32 {
        let frames = self.ring_buffer_size as f32 / self.channels.max(1) as f32;
        frames / self.sample_rate as f32 * 1000.0
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::low_latency(DEFAULT_SAMPLE_RATE)
    }
}
