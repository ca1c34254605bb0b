//! Audio system for retro-host
//!
//! The emulation step writes interleaved stereo `i16` samples into a
//! [`RingBuffer`]; the device callback pulls them back out on its own clock.

pub mod backend;
pub mod output;
pub mod resampler;
pub mod ring_buffer;

pub use backend::{AudioBackend, CpalAudioBackend, NullAudioBackend};
pub use output::AudioOutput;
pub use ring_buffer::RingBuffer;
