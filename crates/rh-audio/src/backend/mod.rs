//! Audio backends

pub mod cpal_backend;
pub mod null;

pub use cpal_backend::CpalAudioBackend;
pub use null::NullAudioBackend;

use crate::ring_buffer::RingBuffer;
use rh_core::error::AudioError;
use std::sync::Arc;

/// A device that drains a [`RingBuffer`] on its own clock
pub trait AudioBackend {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Open the device and start pulling from `ring` at `sample_rate` Hz
    fn start(&mut self, ring: Arc<RingBuffer>, sample_rate: u32) -> Result<(), AudioError>;

    /// Stop pulling and release the device
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}
