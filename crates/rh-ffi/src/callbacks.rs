//! Callback signatures the host hands to a core

use libc::{c_uint, c_void, size_t};

pub type EnvironmentFn = unsafe extern "C" fn(cmd: c_uint, data: *mut c_void) -> bool;
pub type VideoRefreshFn =
    unsafe extern "C" fn(data: *const c_void, width: c_uint, height: c_uint, pitch: size_t);
pub type AudioSampleFn = unsafe extern "C" fn(left: i16, right: i16);
pub type AudioSampleBatchFn = unsafe extern "C" fn(data: *const i16, frames: size_t) -> size_t;
pub type InputPollFn = unsafe extern "C" fn();
pub type InputStateFn =
    unsafe extern "C" fn(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16;

/// The full set of host entry points registered with a core before `retro_init`
#[derive(Debug, Clone, Copy)]
pub struct HostCallbacks {
    pub environment: EnvironmentFn,
    pub video_refresh: VideoRefreshFn,
    pub audio_sample: AudioSampleFn,
    pub audio_sample_batch: AudioSampleBatchFn,
    pub input_poll: InputPollFn,
    pub input_state: InputStateFn,
}
