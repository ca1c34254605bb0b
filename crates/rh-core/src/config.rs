//! Configuration system for retro-host

use serde::{Deserialize, Serialize};
use crate::error::{HostError, Result};
use std::path::{Path, PathBuf};

/// Default audio ring capacity in samples (~140 ms of 44.1 kHz stereo)
pub const DEFAULT_RING_CAPACITY: usize = 12288;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub audio: AudioConfig,
    pub video: VideoConfig,
    pub paths: PathConfig,
    pub debug: DebugConfig,
}

/// General host settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Console profile used when none is given on the command line
    pub default_console: String,
    pub start_paused: bool,
}

/// Audio settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub backend: AudioBackend,
    pub enable: bool,
    pub volume: f32,
    /// Ring buffer size in interleaved samples
    pub ring_capacity: usize,
}

/// Audio backend type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum AudioBackend {
    #[default]
    Auto,
    Null,
}

/// Video settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Integer window scale relative to the core's base geometry
    pub window_scale: u32,
    /// Draw a blurred duplicate behind the main view
    pub glow: bool,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Documents root holding `system/`, `saves/` and `states/`
    pub documents: PathBuf,
    /// Directories searched for core binaries, in order
    pub core_search: Vec<PathBuf>,
}

/// Debug settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
}

/// Logging level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive string understood by `EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_console: "psx".to_string(),
            start_paused: false,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: AudioBackend::default(),
            enable: true,
            volume: 1.0,
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            window_scale: 3,
            glow: false,
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        let documents = dirs::document_dir()
            .or_else(dirs::data_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("retro-host");

        let mut core_search = vec![documents.join("cores")];
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(PathBuf::from))
        {
            core_search.push(exe_dir);
        }

        Self {
            documents,
            core_search,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Parse the configuration file at `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| HostError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| HostError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("retro-host")
            .join("config.toml")
    }
}
