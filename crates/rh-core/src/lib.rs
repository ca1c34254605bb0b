//! Core types for the retro-host libretro frontend
//!
//! This crate provides the foundational types shared by every other crate:
//! error handling, configuration, console profiles and logging setup.

pub mod config;
pub mod error;
pub mod logging;
pub mod profile;

pub use config::Config;
pub use error::{HostError, Result};
pub use profile::ConsoleProfile;
