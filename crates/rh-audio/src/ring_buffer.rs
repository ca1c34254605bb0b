//! Lock-protected stereo ring buffer
//!
//! Single producer (the emulation step) and single consumer (the device
//! callback). Both sides take the same short lock. A full buffer drops its
//! oldest frame instead of blocking the producer; an empty buffer yields
//! silence instead of blocking the consumer.

use parking_lot::Mutex;

/// Samples per frame (interleaved left/right)
pub const CHANNELS: usize = 2;

struct Ring {
    data: Vec<i16>,
    read: usize,
    write: usize,
}

impl Ring {
    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn len(&self) -> usize {
        (self.write + self.capacity() - self.read) % self.capacity()
    }

    fn push_frame(&mut self, left: i16, right: i16) {
        let cap = self.capacity();
        let next = (self.write + CHANNELS) % cap;
        if next == self.read {
            self.read = (self.read + CHANNELS) % cap;
        }
        self.data[self.write] = left;
        self.data[self.write + 1] = right;
        self.write = next;
    }

    fn pop_frame(&mut self) -> Option<(i16, i16)> {
        if self.read == self.write {
            return None;
        }
        let frame = (self.data[self.read], self.data[self.read + 1]);
        self.read = (self.read + CHANNELS) % self.capacity();
        Some(frame)
    }
}

/// Fixed-capacity circular buffer of interleaved stereo `i16` samples.
///
/// `write == read` means empty, so at most `capacity - 2` samples are held.
pub struct RingBuffer {
    inner: Mutex<Ring>,
}

impl RingBuffer {
    /// Create a buffer holding `capacity` samples.
    ///
    /// Capacity is rounded down to a whole number of frames, minimum two frames.
    pub fn new(capacity: usize) -> Self {
        let capacity = (capacity - capacity % CHANNELS).max(CHANNELS * 2);
        Self {
            inner: Mutex::new(Ring {
                data: vec![0; capacity],
                read: 0,
                write: 0,
            }),
        }
    }

    /// Append up to `frames` frames from `samples`. Never blocks on a full buffer.
    pub fn write(&self, samples: &[i16], frames: usize) {
        let frames = frames.min(samples.len() / CHANNELS);
        let mut ring = self.inner.lock();
        for frame in samples[..frames * CHANNELS].chunks_exact(CHANNELS) {
            ring.push_frame(frame[0], frame[1]);
        }
    }

    /// Append a single frame
    pub fn write_frame(&self, left: i16, right: i16) {
        self.inner.lock().push_frame(left, right);
    }

    /// Fill `out` with buffered frames, padding with silence on underrun.
    ///
    /// Returns the number of frames that came from the buffer.
    pub fn pull_into(&self, out: &mut [i16]) -> usize {
        let mut ring = self.inner.lock();
        let mut read = 0;
        for frame in out.chunks_exact_mut(CHANNELS) {
            match ring.pop_frame() {
                Some((l, r)) => {
                    frame[0] = l;
                    frame[1] = r;
                    read += 1;
                }
                None => frame.fill(0),
            }
        }
        read
    }

    /// Pull exactly `frames` frames (`frames * 2` samples), silence-padded
    pub fn pull(&self, frames: usize) -> Vec<i16> {
        let mut out = vec![0; frames * CHANNELS];
        self.pull_into(&mut out);
        out
    }

    /// Zero both indices and the contents
    pub fn reset(&self) {
        let mut ring = self.inner.lock();
        ring.data.fill(0);
        ring.read = 0;
        ring.write = 0;
    }

    /// Discard everything buffered
    pub fn flush(&self) {
        let mut ring = self.inner.lock();
        ring.read = 0;
        ring.write = 0;
    }

    /// Buffered samples
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        let ring = self.inner.lock();
        ring.read == ring.write
    }

    /// Total slots in samples
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Current `(read, write)` indices in samples
    pub fn indices(&self) -> (usize, usize) {
        let ring = self.inner.lock();
        (ring.read, ring.write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(range: std::ops::Range<i16>) -> Vec<i16> {
        range.flat_map(|i| [i, -i]).collect()
    }

    #[test]
    fn test_write_then_pull() {
        let ring = RingBuffer::new(16);
        ring.write(&frames(1..4), 3);
        assert_eq!(ring.len(), 6);
        assert_eq!(ring.pull(3), vec![1, -1, 2, -2, 3, -3]);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_underrun_pads_with_silence() {
        let ring = RingBuffer::new(16);
        ring.write(&frames(1..3), 2);

        let mut out = [7i16; 10];
        let got = ring.pull_into(&mut out);
        assert_eq!(got, 2);
        assert_eq!(out, [1, -1, 2, -2, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let ring = RingBuffer::new(8);
        // 3 usable frames; write 5
        ring.write(&frames(1..6), 5);
        assert_eq!(ring.len(), 6);
        assert_eq!(ring.pull(3), vec![3, -3, 4, -4, 5, -5]);
    }

    #[test]
    fn test_frame_count_is_clamped_to_slice() {
        let ring = RingBuffer::new(16);
        ring.write(&[1, 2, 3], 10);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_reset_and_flush() {
        let ring = RingBuffer::new(16);
        ring.write(&frames(1..5), 4);
        ring.pull(1);

        ring.flush();
        assert_eq!(ring.indices(), (0, 0));
        assert!(ring.is_empty());

        ring.write(&frames(1..5), 4);
        ring.reset();
        assert_eq!(ring.indices(), (0, 0));
        assert_eq!(ring.pull(2), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_odd_capacity_rounds_to_frames() {
        assert_eq!(RingBuffer::new(13).capacity(), 12);
        assert_eq!(RingBuffer::new(0).capacity(), 4);
    }

    #[test]
    fn test_indices_stay_in_range_under_interleaving() {
        let ring = RingBuffer::new(32);
        let cap = ring.capacity();
        // Deterministic pseudo-random schedule of writes and pulls
        let mut seed: u32 = 0x1234_5678;
        let mut next: i16 = 1;

        for _ in 0..2000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let n = ((seed >> 16) % 24) as usize;
            if seed & 1 == 0 {
                let batch: Vec<i16> = (0..n)
                    .flat_map(|_| {
                        let v = next;
                        next = next.wrapping_add(1);
                        [v, v]
                    })
                    .collect();
                ring.write(&batch, n);
            } else {
                ring.pull(n);
            }
            let (r, w) = ring.indices();
            assert!(r < cap && w < cap);
            assert!(ring.len() <= cap - CHANNELS);
        }

        // Overfill: only the most recent cap - 2 samples survive
        let batch: Vec<i16> = (0..100).flat_map(|i| [i, i]).collect();
        ring.write(&batch, 100);
        let held = ring.pull((cap - CHANNELS) / CHANNELS);
        assert_eq!(held, batch[batch.len() - (cap - CHANNELS)..]);
    }

    #[test]
    fn test_concurrent_producer_consumer() {
        use std::sync::Arc;
        use std::thread;

        let ring = Arc::new(RingBuffer::new(256));
        let producer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for i in 0..10_000i16 {
                    ring.write_frame(i, i);
                }
            })
        };
        let consumer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut out = [0i16; 64];
                for _ in 0..1000 {
                    ring.pull_into(&mut out);
                    for frame in out.chunks_exact(2) {
                        assert_eq!(frame[0], frame[1]);
                    }
                }
            })
        };
        producer.join().unwrap();
        consumer.join().unwrap();
        let (r, w) = ring.indices();
        assert!(r < 256 && w < 256);
    }
}
