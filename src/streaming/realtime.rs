//! Producer-side streaming interface
//!
//! [`RealtimeStream`] is what the render thread talks to: it owns the shared
//! ring buffer, applies backpressure when the device side falls behind, and
//! keeps counters for monitoring buffer health.

use super::{RingBuffer, StreamConfig, BUFFER_BACKOFF_MICROS};
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Counters for monitoring streaming health
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    /// Non-blocking writes that could not take every sample (buffer full)
    pub overrun_count: usize,
    /// Times the device side found the buffer empty and played silence
    pub underrun_count: usize,
    /// Samples accepted into the buffer so far
    pub samples_written: usize,
    /// Buffer occupancy after the last write, 0.0 to 1.0
    pub fill_percentage: f32,
}

/// Producer handle for real-time playback.
pub struct RealtimeStream {
    buffer: Arc<RingBuffer>,
    config: StreamConfig,
    stats: Mutex<StreamStats>,
}

impl RealtimeStream {
    /// Creates a stream with a buffer sized per `config`.
    pub fn new(config: StreamConfig) -> Result<Self> {
        let buffer = Arc::new(RingBuffer::new(config.ring_buffer_size)?);
        Ok(RealtimeStream {
            buffer,
            config,
            stats: Mutex::new(StreamStats::default()),
        })
    }

    /// Shared handle to the ring buffer, for hooking up an
    /// [`AudioDevice`](super::AudioDevice).
    pub fn buffer(&self) -> Arc<RingBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Writes all samples, sleeping in small steps while the buffer is full.
    pub fn write_blocking(&self, samples: &[f32]) -> usize {
        let mut remaining = samples;
        let mut total_written = 0usize;
        while !remaining.is_empty() {
            let written = self.buffer.write(remaining);
            if written == 0 {
                std::thread::sleep(Duration::from_micros(BUFFER_BACKOFF_MICROS));
                continue;
            }
            remaining = &remaining[written..];
            total_written += written;

            let mut stats = self.stats.lock();
            stats.samples_written += written;
            stats.fill_percentage = self.buffer.fill_percentage();
        }
        total_written
    }

    /// Writes what fits right now; counts an overrun if anything was dropped.
    pub fn write_nonblocking(&self, samples: &[f32]) -> usize {
        let written = self.buffer.write(samples);
        let mut stats = self.stats.lock();
        if written < samples.len() {
            stats.overrun_count += 1;
        }
        stats.samples_written += written;
        stats.fill_percentage = self.buffer.fill_percentage();
        written
    }

    /// Samples that can be written without blocking.
    pub fn available_write(&self) -> usize {
        self.buffer.available_write()
    }

    /// Samples queued and not yet consumed by the device.
    pub fn pending(&self) -> usize {
        self.buffer.available_read()
    }

    /// Current buffer occupancy, 0.0 to 1.0.
    pub fn fill_percentage(&self) -> f32 {
        self.buffer.fill_percentage()
    }

    /// Drops everything queued (for stop/seek).
    pub fn flush(&self) {
        self.buffer.clear();
    }

    /// Snapshot of the counters. Underruns are recorded on the consumer
    /// side, so they are read back from the shared buffer here.
    pub fn stats(&self) -> StreamStats {
        let mut stats = self.stats.lock().clone();
        stats.underrun_count = self.buffer.underrun_count();
        stats
    }

    /// The stream configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Full-buffer latency in milliseconds.
    pub fn latency_ms(&self) -> f32 {
        self.config.latency_ms()
    }
}
