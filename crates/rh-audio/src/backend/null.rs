//! Null audio backend
//!
//! Never opens a device. The ring buffer keeps being fed by the core, so the
//! rest of the host behaves exactly as with real output.

use super::AudioBackend;
use crate::ring_buffer::RingBuffer;
use rh_core::error::AudioError;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct NullAudioBackend {
    sample_rate: Option<u32>,
}

impl NullAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rate passed to the last `start`, while active
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }
}

impl AudioBackend for NullAudioBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    fn start(&mut self, _ring: Arc<RingBuffer>, sample_rate: u32) -> Result<(), AudioError> {
        tracing::debug!("Null audio started at {} Hz", sample_rate);
        self.sample_rate = Some(sample_rate);
        Ok(())
    }

    fn stop(&mut self) {
        self.sample_rate = None;
    }

    fn is_active(&self) -> bool {
        self.sample_rate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_backend_lifecycle() {
        let mut backend = NullAudioBackend::new();
        assert!(!backend.is_active());

        backend.start(Arc::new(RingBuffer::new(16)), 32000).unwrap();
        assert!(backend.is_active());
        assert_eq!(backend.sample_rate(), Some(32000));

        backend.stop();
        assert!(!backend.is_active());
    }
}
