//! Configuration module for displacement-stream
//!
//! This module handles:
//! - Worker settings (target, mode, sequence, algorithm, run flags)
//! - Project layout (where the build tool lives and where it puts the binary)
//! - Ingestion server, live view and interpolation settings
//!
//! # Config File
//!
//! Settings can be stored in a TOML file. Every table is optional and missing
//! keys fall back to their defaults. Without `--config`, the file is looked up
//! in the platform config directory under `displacement-stream/config.toml`:
//!
//! - **Linux**: `~/.config/displacement-stream/config.toml`
//! - **macOS**: `~/Library/Application Support/displacement-stream/config.toml`
//! - **Windows**: `%APPDATA%\displacement-stream\config.toml`
//!
//! # Example
//!
//! ```toml
//! [worker]
//! target = "rpi"
//! mode = "release"
//! algorithm = 2
//!
//! [server]
//! bind_address = "0.0.0.0"
//! port = 5555
//!
//! [interpolation]
//! samples_per_segment = 8
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{Result, StreamError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "displacement-stream";

/// Config filename inside the platform config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Default live view refresh interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// How long to wait for the stream to close after the worker exited
pub const DEFAULT_STREAM_CLOSE_TIMEOUT_MS: u64 = 5000;

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub worker: WorkerConfig,
    pub project: ProjectLayout,
    pub server: ServerConfig,
    pub view: ViewConfig,
    pub interpolation: InterpolationConfig,
    pub logging: LoggingConfig,
    /// Grace period for the point stream to close once the worker has exited
    pub stream_close_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            worker: WorkerConfig::default(),
            project: ProjectLayout::default(),
            server: ServerConfig::default(),
            view: ViewConfig::default(),
            interpolation: InterpolationConfig::default(),
            logging: LoggingConfig::default(),
            stream_close_timeout_ms: DEFAULT_STREAM_CLOSE_TIMEOUT_MS,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StreamError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| e.with_context(format!("Loading {}", path.display())))
    }

    /// Load from `path` if given, else from the default location if that file
    /// exists, else return the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(default) if default.is_file() => {
                tracing::debug!("Using config file {:?}", default);
                Self::load(default)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| StreamError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| StreamError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StreamError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        std::fs::write(path, content).map_err(|e| {
            StreamError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })?;

        Ok(())
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.interpolation.samples_per_segment == 0 {
            return Err(StreamError::Config(
                "interpolation.samples_per_segment must be at least 1".to_string(),
            ));
        }
        if self.view.poll_interval_ms == 0 {
            return Err(StreamError::Config(
                "view.poll_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.project.build_target.is_empty() {
            return Err(StreamError::Config(
                "project.build_target must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn stream_close_timeout(&self) -> Duration {
        Duration::from_millis(self.stream_close_timeout_ms)
    }

    /// Sequence path as handed to the worker
    pub fn sequence_path(&self) -> PathBuf {
        self.project.resolve(&self.worker.sequence)
    }
}

/// Where the worker sources live and how they are built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectLayout {
    /// Project root handed to the build tool
    pub root: PathBuf,
    /// Build tool executable
    pub build_tool: String,
    /// Parallel build jobs
    pub jobs: u32,
    /// Build target name, also the name of the produced binary
    pub build_target: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            build_tool: "scons".to_string(),
            jobs: 10,
            build_target: "pipeline".to_string(),
        }
    }
}

impl ProjectLayout {
    /// Build tree for one target/mode combination
    pub fn build_dir(&self, target: Target, mode: BuildMode) -> PathBuf {
        self.root
            .join("build")
            .join(target.as_str())
            .join(mode.as_str())
    }

    /// Path of the binary the build produces
    pub fn binary_path(&self, target: Target, mode: BuildMode) -> PathBuf {
        self.build_dir(target, mode)
            .join("bin")
            .join(&self.build_target)
    }

    /// Resolve `path` against the project root unless it is absolute
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Ingestion server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to, also passed to the worker
    pub bind_address: String,
    /// Listen port; 0 picks an ephemeral port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 0,
        }
    }
}

/// Live view settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Refresh interval of the live view in milliseconds
    pub poll_interval_ms: u64,
    /// Marker color as RGBA
    pub color: [u8; 4],
    /// Marker radius in points
    pub marker_radius: f32,
    pub title: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            color: [31, 119, 180, 255],
            marker_radius: 2.0,
            title: "Displacement".to_string(),
        }
    }
}

impl ViewConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Post-processing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationConfig {
    /// Replace exact (0, 0) dropout samples before resampling
    pub repair_dropouts: bool,
    /// Spline samples generated per segment between two input points
    pub samples_per_segment: usize,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            repair_dropouts: true,
            samples_per_segment: 4,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write logs to a timestamped file in this directory
    pub log_dir: Option<PathBuf>,
}
