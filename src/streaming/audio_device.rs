//! Audio device integration using rodio
//!
//! Pulls samples out of the shared ring buffer and feeds them to the system
//! output device. Underruns produce silence so the stream stays alive while
//! the producer catches up.

use super::{RingBuffer, StreamConfig};
use crate::{Result, VgmError};
use rodio::{OutputStream, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Batch size for draining the ring buffer, in samples.
const BATCH_LEN: usize = 4096;

/// rodio source backed by the shared ring buffer.
struct RingBufferSource {
    ring_buffer: Arc<RingBuffer>,
    sample_rate: u32,
    channels: u16,
    finished: Arc<AtomicBool>,
    /// Local batch to keep lock acquisitions off the per-sample path.
    batch: Vec<f32>,
    batch_pos: usize,
    batch_len: usize,
}

impl RingBufferSource {
    fn new(
        ring_buffer: Arc<RingBuffer>,
        sample_rate: u32,
        channels: u16,
        finished: Arc<AtomicBool>,
    ) -> Self {
        RingBufferSource {
            ring_buffer,
            sample_rate,
            channels,
            finished,
            batch: vec![0.0; BATCH_LEN],
            batch_pos: 0,
            batch_len: 0,
        }
    }
}

impl Source for RingBufferSource {
    fn current_frame_len(&self) -> Option<usize> {
        let available = self.ring_buffer.available_read();
        if available > 0 {
            Some(available)
        } else {
            Some(BATCH_LEN)
        }
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

impl Iterator for RingBufferSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.batch_pos >= self.batch_len {
            if self.finished.load(Ordering::Relaxed) && self.ring_buffer.is_empty() {
                return None;
            }
            let read = self.ring_buffer.read(&mut self.batch);
            if read > 0 {
                self.batch_len = read;
            } else {
                // Underrun: a batch of silence keeps the device fed.
                self.ring_buffer.record_underrun();
                self.batch.fill(0.0);
                self.batch_len = self.batch.len();
            }
            self.batch_pos = 0;
        }
        let sample = self.batch[self.batch_pos];
        self.batch_pos += 1;
        Some(sample)
    }
}

/// System audio output fed from a [`RingBuffer`].
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    finished: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Opens the default output device and starts consuming `ring_buffer`.
    pub fn new(config: &StreamConfig, ring_buffer: Arc<RingBuffer>) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| VgmError::AudioDeviceError(format!("failed to open stream: {}", e)))?;
        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| VgmError::AudioDeviceError(format!("failed to create sink: {}", e)))?;

        let finished = Arc::new(AtomicBool::new(false));
        let source = RingBufferSource::new(
            ring_buffer,
            config.sample_rate,
            config.channels,
            Arc::clone(&finished),
        );
        sink.append(source);

        Ok(AudioDevice {
            _stream: stream,
            sink,
            finished,
        })
    }

    /// Pauses device-side playback.
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resumes device-side playback.
    pub fn play(&self) {
        self.sink.play();
    }

    /// Signals that no more samples are coming; the source ends once the
    /// buffer drains instead of playing silence forever.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }

    /// Blocks until the sink has played everything.
    pub fn wait_for_finish(&self) {
        self.sink.sleep_until_end();
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.finished.store(true, Ordering::Relaxed);
        self.sink.pause();
    }
}
