//! cpal audio backend
//!
//! Opens the default output device, preferring the core's own sample rate.
//! When the device cannot run at that rate the stream falls back to the
//! device default and the feeder resamples.

use super::AudioBackend;
use crate::resampler::StreamFeeder;
use crate::ring_buffer::RingBuffer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, Host, SampleFormat, SampleRate, Stream, StreamConfig};
use rh_core::error::AudioError;
use std::sync::Arc;

/// cpal audio backend
pub struct CpalAudioBackend {
    host: Host,
    stream: Option<Stream>,
    volume: f32,
    device_rate: Option<u32>,
}

impl CpalAudioBackend {
    /// Create a backend on the default host. No device is opened yet.
    pub fn new(volume: f32) -> Self {
        Self {
            host: cpal::default_host(),
            stream: None,
            volume: volume.clamp(0.0, 1.0),
            device_rate: None,
        }
    }

    /// Rate the device is actually running at
    pub fn device_rate(&self) -> Option<u32> {
        self.device_rate
    }

    fn supports_rate(device: &Device, rate: u32) -> bool {
        device
            .supported_output_configs()
            .map(|mut configs| {
                configs.any(|c| {
                    c.channels() == 2
                        && c.sample_format() == SampleFormat::F32
                        && c.min_sample_rate().0 <= rate
                        && rate <= c.max_sample_rate().0
                })
            })
            .unwrap_or(false)
    }

    fn build_stream(
        &self,
        device: &Device,
        config: &StreamConfig,
        ring: Arc<RingBuffer>,
        source_rate: u32,
    ) -> Result<Stream, AudioError> {
        let channels = config.channels as usize;
        let mut feeder = StreamFeeder::new(source_rate, config.sample_rate.0, self.volume);

        device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    feeder.fill(&ring, data, channels);
                },
                |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::Stream(format!("Failed to build output stream: {}", e)))
    }
}

impl AudioBackend for CpalAudioBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn start(&mut self, ring: Arc<RingBuffer>, sample_rate: u32) -> Result<(), AudioError> {
        self.stop();

        let device = self.host.default_output_device().ok_or(AudioError::NoDevice)?;
        tracing::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = if Self::supports_rate(&device, sample_rate) {
            StreamConfig {
                channels: 2,
                sample_rate: SampleRate(sample_rate),
                buffer_size: BufferSize::Default,
            }
        } else {
            let fallback = device
                .default_output_config()
                .map_err(|e| AudioError::Stream(format!("Failed to get output config: {}", e)))?;
            tracing::warn!(
                "Device refuses {} Hz, resampling to {} Hz",
                sample_rate,
                fallback.sample_rate().0
            );
            fallback.into()
        };

        let stream = self.build_stream(&device, &config, ring, sample_rate)?;
        stream
            .play()
            .map_err(|e| AudioError::Stream(format!("Failed to play stream: {}", e)))?;

        tracing::info!(
            "Audio stream started: {} Hz, {} ch",
            config.sample_rate.0,
            config.channels
        );
        self.device_rate = Some(config.sample_rate.0);
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                tracing::warn!("Failed to pause stream: {}", e);
            }
            tracing::info!("Audio stream stopped");
        }
        self.device_rate = None;
    }

    fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

impl Default for CpalAudioBackend {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Drop for CpalAudioBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_creation() {
        let backend = CpalAudioBackend::new(2.0);
        assert!(!backend.is_active());
        assert_eq!(backend.volume, 1.0);
        assert_eq!(backend.device_rate(), None);
    }

    #[test]
    fn test_backend_start() {
        // May fail in CI environments without audio
        let mut backend = CpalAudioBackend::default();
        let ring = Arc::new(RingBuffer::new(1024));
        if backend.start(ring, 44100).is_ok() {
            assert!(backend.is_active());
            assert!(backend.device_rate().is_some());
            backend.stop();
        }
        assert!(!backend.is_active());
    }
}
