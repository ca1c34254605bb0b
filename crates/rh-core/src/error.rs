//! Error types for the retro-host frontend

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the host
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Video error: {0}")]
    Video(#[from] VideoError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Game load failed: {0}")]
    GameLoadFailed(String),

    #[error("Invalid host state: {0}")]
    InvalidState(&'static str),
}

/// Errors raised while locating, opening or binding a core library
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Core not found (searched {} candidates)", candidates.len())]
    CoreNotFound { candidates: Vec<PathBuf> },

    #[error("Failed to load core {}: {reason}", path.display())]
    CoreLoadFailed { path: PathBuf, reason: String },

    #[error("Missing required symbol: {0}")]
    MissingSymbol(&'static str),

    #[error("A core is already loaded")]
    AlreadyLoaded,

    #[error("No core loaded")]
    NotLoaded,
}

/// Save state and persistent memory errors
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Core does not support this operation")]
    Unsupported,

    #[error("Serialized size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Core rejected the state buffer")]
    CoreRejected,

    #[error("Save file ({file} bytes) larger than memory region ({region} bytes)")]
    RegionTooSmall { file: usize, region: usize },

    #[error("No content loaded")]
    NoContent,
}

/// Audio output errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No output device available")]
    NoDevice,

    #[error("Stream error: {0}")]
    Stream(String),
}

/// Video sink errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Frame of {height} rows with stride {stride} needs more than {len} bytes")]
    FrameTooSmall { height: u32, stride: usize, len: usize },
}

/// Result type alias for host operations
pub type Result<T> = std::result::Result<T, HostError>;
