//! Host integration layer for retro-host
//!
//! This crate ties the subsystems together around one loaded core:
//! - Environment negotiation (directories, pixel format, core options)
//! - Video frame hand-off to a texture and its views
//! - Frame pacing with catch-up cap and fast-forward
//! - Save states and battery-backed save RAM
//! - The C callback trampolines the core calls into

pub mod callbacks;
pub mod environment;
pub mod host;
pub mod pacer;
pub mod state_io;
pub mod video;

pub use environment::{EnvCommand, EnvironmentNegotiator};
pub use host::RetroHost;
pub use pacer::{Clock, FastForward, FramePacer, FrameTiming, ManualClock, PacerState, TickOutcome};
pub use state_io::StateIo;
pub use video::{CpuFrame, CpuTexture, FrameView, TextureTarget, VideoSink};
