//! C ABI bridge to libretro cores
//!
//! Everything in here mirrors `libretro.h` byte for byte. Nothing in this
//! crate calls into a core; it only names the shapes both sides agree on.

pub mod callbacks;
pub mod types;

pub use callbacks::{
    AudioSampleBatchFn, AudioSampleFn, EnvironmentFn, HostCallbacks, InputPollFn, InputStateFn,
    VideoRefreshFn,
};
pub use types::{
    env, GameGeometry, GameInfo, PixelFormat, SystemAvInfo, SystemTiming, Variable,
    DEVICE_JOYPAD, DEVICE_NONE, MEMORY_SAVE_RAM, RETRO_API_VERSION,
};
