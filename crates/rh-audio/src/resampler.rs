//! Pull-side sample feeding for the output stream
//!
//! Converts ring buffer frames into device samples, stepping linearly
//! through source frames when the device runs at a different rate.

use crate::ring_buffer::{RingBuffer, CHANNELS};

/// Frames pulled from the ring at a time when resampling
const CHUNK_FRAMES: usize = 64;

#[inline]
fn to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

/// Feeds device buffers from a [`RingBuffer`]
pub struct StreamFeeder {
    step: f64,
    pos: f64,
    current: [f32; 2],
    next: [f32; 2],
    chunk: Vec<i16>,
    chunk_frames: usize,
    cursor: usize,
    volume: f32,
}

impl StreamFeeder {
    /// Feeder producing `device_rate` frames per second from `source_rate` input
    pub fn new(source_rate: u32, device_rate: u32, volume: f32) -> Self {
        let step = if device_rate == 0 {
            1.0
        } else {
            source_rate as f64 / device_rate as f64
        };
        Self {
            step,
            pos: 0.0,
            current: [0.0; 2],
            next: [0.0; 2],
            chunk: vec![0; CHUNK_FRAMES * CHANNELS],
            chunk_frames: 0,
            cursor: 0,
            volume,
        }
    }

    /// Whether source and device rates match
    pub fn is_passthrough(&self) -> bool {
        self.step == 1.0
    }

    /// Fill an interleaved device buffer with `channels` channels.
    ///
    /// Channels beyond the first two are zero-filled.
    pub fn fill(&mut self, ring: &RingBuffer, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        if self.is_passthrough() {
            self.fill_direct(ring, out, channels);
        } else {
            self.fill_resampled(ring, out, channels);
        }
    }

    fn fill_direct(&mut self, ring: &RingBuffer, out: &mut [f32], channels: usize) {
        let frames = out.len() / channels;
        if self.chunk.len() < frames * CHANNELS {
            self.chunk.resize(frames * CHANNELS, 0);
        }
        let src = &mut self.chunk[..frames * CHANNELS];
        ring.pull_into(src);

        for (frame, pair) in out.chunks_exact_mut(channels).zip(src.chunks_exact(CHANNELS)) {
            write_frame(frame, [to_f32(pair[0]), to_f32(pair[1])], self.volume);
        }
    }

    fn fill_resampled(&mut self, ring: &RingBuffer, out: &mut [f32], channels: usize) {
        for frame in out.chunks_exact_mut(channels) {
            let t = self.pos as f32;
            let mixed = [
                self.current[0] + (self.next[0] - self.current[0]) * t,
                self.current[1] + (self.next[1] - self.current[1]) * t,
            ];
            write_frame(frame, mixed, self.volume);

            self.pos += self.step;
            while self.pos >= 1.0 {
                self.current = self.next;
                self.next = self.take_frame(ring);
                self.pos -= 1.0;
            }
        }
    }

    fn take_frame(&mut self, ring: &RingBuffer) -> [f32; 2] {
        if self.cursor >= self.chunk_frames {
            self.chunk.resize(CHUNK_FRAMES * CHANNELS, 0);
            self.chunk_frames = ring.pull_into(&mut self.chunk);
            self.cursor = 0;
            if self.chunk_frames == 0 {
                return [0.0; 2];
            }
        }
        let i = self.cursor * CHANNELS;
        self.cursor += 1;
        [to_f32(self.chunk[i]), to_f32(self.chunk[i + 1])]
    }
}

#[inline]
fn write_frame(frame: &mut [f32], stereo: [f32; 2], volume: f32) {
    match frame.len() {
        1 => frame[0] = (stereo[0] + stereo[1]) * 0.5 * volume,
        _ => {
            frame[0] = stereo[0] * volume;
            frame[1] = stereo[1] * volume;
            frame[2..].fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_converts_samples() {
        let ring = RingBuffer::new(64);
        ring.write(&[16384, -16384, 0, 32767], 2);

        let mut feeder = StreamFeeder::new(44100, 44100, 1.0);
        assert!(feeder.is_passthrough());

        let mut out = [1.0f32; 6];
        feeder.fill(&ring, &mut out, 2);
        assert_eq!(out[0], 0.5);
        assert_eq!(out[1], -0.5);
        assert_eq!(out[2], 0.0);
        assert!((out[3] - 1.0).abs() < 1e-4);
        assert_eq!(&out[4..], &[0.0, 0.0], "underrun must be silent");
    }

    #[test]
    fn test_extra_channels_zeroed() {
        let ring = RingBuffer::new(64);
        ring.write(&[8192, 8192], 1);

        let mut feeder = StreamFeeder::new(48000, 48000, 1.0);
        let mut out = [9.0f32; 4];
        feeder.fill(&ring, &mut out, 4);
        assert_eq!(out, [0.25, 0.25, 0.0, 0.0]);
    }

    #[test]
    fn test_upsampling_consumes_fewer_frames() {
        let ring = RingBuffer::new(4096);
        let samples: Vec<i16> = (0..1000).flat_map(|_| [1000i16, 1000]).collect();
        ring.write(&samples, 1000);

        // 22050 -> 44100 consumes one source frame per two device frames
        let mut feeder = StreamFeeder::new(22050, 44100, 1.0);
        let mut out = vec![0.0f32; 200 * 2];
        feeder.fill(&ring, &mut out, 2);

        let consumed = 1000 - ring.len() / 2;
        assert!(consumed >= 100 && consumed <= 100 + CHUNK_FRAMES, "consumed {consumed}");
        let level = 1000.0 / 32768.0;
        assert!((out[out.len() - 2] - level).abs() < 1e-4);
    }

    #[test]
    fn test_volume_applied() {
        let ring = RingBuffer::new(64);
        ring.write(&[16384, 16384], 1);

        let mut feeder = StreamFeeder::new(44100, 44100, 0.5);
        let mut out = [0.0f32; 2];
        feeder.fill(&ring, &mut out, 2);
        assert_eq!(out, [0.25, 0.25]);
    }
}
