//! Worker settings resolved once at startup
//!
//! These describe *what* to build and run. They are parsed from the command
//! line or the `[worker]` table of the config file and never change afterwards.
//!
//! # Main Types
//!
//! - [`WorkerConfig`] - Target, build mode, sequence, algorithm and run flags
//! - [`Target`] / [`BuildMode`] / [`LogLevel`] / [`Algorithm`] - The values the
//!   build tool and the worker binary understand

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default result file name
pub const DEFAULT_OUTPUT_FILE: &str = "displacements.result";

/// Default input sequence, relative to the project root
pub const DEFAULT_SEQUENCE: &str = "testSequences/tennisball_video2/tennisball_video2_DVD.dvd";

/// Platform the worker is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Native,
    Rpi,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Native => "native",
            Target::Rpi => "rpi",
        }
    }
}

/// Build flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Release => "release",
        }
    }
}

/// Log level compiled into the worker. Also picks the default filter for our
/// own tracing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }

    /// Default `EnvFilter` directive for this level
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "info,displacement_stream=debug",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Feature detector / matcher combination run by the worker.
///
/// The worker receives the numeric index on its command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum Algorithm {
    #[default]
    SurfBfm = 0,
    SurfFlann = 1,
    SiftBfm = 2,
    SiftFlann = 3,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::SurfBfm,
        Algorithm::SurfFlann,
        Algorithm::SiftBfm,
        Algorithm::SiftFlann,
    ];

    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn description(&self) -> &'static str {
        match self {
            Algorithm::SurfBfm => "SURF+BFM",
            Algorithm::SurfFlann => "SURF+FLANN",
            Algorithm::SiftBfm => "SIFT+BFM",
            Algorithm::SiftFlann => "SIFT+FLANN",
        }
    }
}

impl TryFrom<u8> for Algorithm {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Algorithm::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("unknown algorithm {} (expected 0-3)", value))
    }
}

impl From<Algorithm> for u8 {
    fn from(alg: Algorithm) -> Self {
        alg.index()
    }
}

macro_rules! impl_str_enum {
    ($ty:ty, $what:literal, [$($variant:expr),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.trim().to_ascii_lowercase();
                $(
                    if lower == $variant.as_str() {
                        return Ok($variant);
                    }
                )+
                Err(format!("unknown {} '{}'", $what, s))
            }
        }
    };
}

impl_str_enum!(Target, "target", [Target::Native, Target::Rpi]);
impl_str_enum!(BuildMode, "mode", [BuildMode::Debug, BuildMode::Release]);
impl_str_enum!(
    LogLevel,
    "log level",
    [LogLevel::Debug, LogLevel::Warning, LogLevel::Error]
);

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid algorithm '{}' (expected 0-3)", s))?;
        Algorithm::try_from(index)
    }
}

/// Everything needed to build and run one worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub target: Target,
    pub mode: BuildMode,
    /// Input sequence handed to the worker. Relative paths are resolved
    /// against the project root.
    pub sequence: PathBuf,
    pub algorithm: Algorithm,
    pub log_level: LogLevel,
    /// Where the processed two-column result is written
    pub output: PathBuf,
    /// Build the worker with profiling enabled
    pub profile: bool,
    /// Remove the previous build tree before building
    pub rebuild: bool,
    /// Run interpolation before exporting
    pub interpolate: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            target: Target::default(),
            mode: BuildMode::default(),
            sequence: PathBuf::from(DEFAULT_SEQUENCE),
            algorithm: Algorithm::default(),
            log_level: LogLevel::default(),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            profile: false,
            rebuild: false,
            interpolate: true,
        }
    }
}

impl WorkerConfig {
    /// `profile=` value the build tool expects
    pub fn profile_flag(&self) -> &'static str {
        if self.profile {
            "yes"
        } else {
            "no"
        }
    }
}
