//! Audio output: the ring buffer plus whichever backend drains it

use crate::backend::{AudioBackend, CpalAudioBackend, NullAudioBackend};
use crate::ring_buffer::RingBuffer;
use rh_core::config::{AudioBackend as BackendKind, AudioConfig};
use std::sync::Arc;

/// Owns the host's single ring buffer and the device stream reading it
pub struct AudioOutput {
    ring: Arc<RingBuffer>,
    backend: Box<dyn AudioBackend>,
    sample_rate: Option<u32>,
}

impl AudioOutput {
    /// Build from configuration. Disabled audio or the `Null` backend never opens a device.
    pub fn new(config: &AudioConfig) -> Self {
        let backend: Box<dyn AudioBackend> = if !config.enable || config.backend == BackendKind::Null
        {
            Box::new(NullAudioBackend::new())
        } else {
            Box::new(CpalAudioBackend::new(config.volume))
        };
        Self::with_backend(Arc::new(RingBuffer::new(config.ring_capacity)), backend)
    }

    pub fn with_backend(ring: Arc<RingBuffer>, backend: Box<dyn AudioBackend>) -> Self {
        Self {
            ring,
            backend,
            sample_rate: None,
        }
    }

    /// Shared handle for the producer side
    pub fn ring(&self) -> &Arc<RingBuffer> {
        &self.ring
    }

    /// Negotiated rate of the loaded game
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn is_running(&self) -> bool {
        self.backend.is_active()
    }

    /// Reset the ring and open output at `rate` Hz.
    ///
    /// A device failure is logged and the host continues silently.
    pub fn start(&mut self, rate: u32) {
        self.ring.reset();
        self.sample_rate = Some(rate);
        self.open(rate);
    }

    /// Reopen output at the previously negotiated rate, keeping buffered audio
    pub fn resume(&mut self) {
        match self.sample_rate {
            Some(rate) if !self.backend.is_active() => self.open(rate),
            Some(_) => {}
            None => tracing::debug!("Audio resume ignored: never started"),
        }
    }

    /// Release the device. The negotiated rate is remembered for `resume`.
    pub fn stop(&mut self) {
        self.backend.stop();
    }

    /// Drop buffered audio without touching the stream
    pub fn flush(&self) {
        self.ring.flush();
    }

    fn open(&mut self, rate: u32) {
        if let Err(e) = self.backend.start(Arc::clone(&self.ring), rate) {
            tracing::warn!(
                "Audio output ({}) unavailable, continuing silently: {}",
                self.backend.name(),
                e
            );
        }
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.backend.stop();
    }
}
