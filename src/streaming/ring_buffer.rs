//! Ring buffer for concurrent sample generation and playback
//!
//! One producer thread writes rendered frames, one consumer thread (the
//! audio callback side) reads them. Storage and both positions live behind
//! a single `parking_lot::Mutex`, so every operation sees a consistent
//! snapshot and the occupancy count makes the full buffer usable (no
//! reserved slot).

use crate::{Result, VgmError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Largest allocation accepted, in samples (256 MB of f32).
const MAX_CAPACITY: usize = 256 * 1024 * 1024 / std::mem::size_of::<f32>();

#[derive(Debug)]
struct Inner {
    storage: Vec<f32>,
    read_pos: usize,
    write_pos: usize,
    /// Number of unread samples; disambiguates full from empty.
    len: usize,
}

/// Fixed-capacity SPSC sample buffer.
///
/// All methods take `&self`; the buffer is safe to share behind an `Arc`
/// between the producer and consumer threads.
#[derive(Debug)]
pub struct RingBuffer {
    inner: Mutex<Inner>,
    capacity: usize,
    /// Times the consumer found the buffer empty and had to substitute
    /// silence. Bumped from the audio callback path, hence atomic.
    underruns: AtomicUsize,
}

impl RingBuffer {
    /// Creates a buffer holding `requested_capacity` samples, rounded up to
    /// the next power of two.
    pub fn new(requested_capacity: usize) -> Result<Self> {
        if requested_capacity == 0 {
            return Err(VgmError::ConfigError(
                "ring buffer capacity must be greater than 0".into(),
            ));
        }
        let capacity = requested_capacity.next_power_of_two();
        if capacity > MAX_CAPACITY {
            return Err(VgmError::ConfigError(format!(
                "ring buffer capacity {} exceeds maximum {}",
                capacity, MAX_CAPACITY
            )));
        }
        Ok(RingBuffer {
            inner: Mutex::new(Inner {
                storage: vec![0.0; capacity],
                read_pos: 0,
                write_pos: 0,
                len: 0,
            }),
            capacity,
            underruns: AtomicUsize::new(0),
        })
    }

    /// Total capacity in samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples ready to be read.
    pub fn available_read(&self) -> usize {
        self.inner.lock().len
    }

    /// Samples that can be written without dropping any.
    pub fn available_write(&self) -> usize {
        self.capacity - self.inner.lock().len
    }

    /// Fraction of the buffer currently occupied, 0.0 to 1.0.
    pub fn fill_percentage(&self) -> f32 {
        self.inner.lock().len as f32 / self.capacity as f32
    }

    /// True if no samples are pending.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().len == 0
    }

    /// Writes as many samples as fit, returning how many were taken.
    pub fn write(&self, samples: &[f32]) -> usize {
        let mut inner = self.inner.lock();
        let to_write = samples.len().min(self.capacity - inner.len);
        for &sample in &samples[..to_write] {
            let pos = inner.write_pos;
            inner.storage[pos] = sample;
            inner.write_pos = (pos + 1) & (self.capacity - 1);
        }
        inner.len += to_write;
        to_write
    }

    /// Reads up to `dest.len()` samples, returning how many were produced.
    pub fn read(&self, dest: &mut [f32]) -> usize {
        let mut inner = self.inner.lock();
        let to_read = dest.len().min(inner.len);
        for slot in dest[..to_read].iter_mut() {
            let pos = inner.read_pos;
            *slot = inner.storage[pos];
            inner.read_pos = (pos + 1) & (self.capacity - 1);
        }
        inner.len -= to_read;
        to_read
    }

    /// Records one consumer-side underrun.
    pub fn record_underrun(&self) {
        self.underruns.fetch_add(1, Ordering::Relaxed);
    }

    /// Underruns recorded so far.
    pub fn underrun_count(&self) -> usize {
        self.underruns.load(Ordering::Relaxed)
    }

    /// Discards everything pending.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.read_pos = inner.write_pos;
        inner.len = 0;
    }
}
