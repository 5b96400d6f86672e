//! Error handling for displacement-stream
//!
//! This module defines the error taxonomy shared by the launcher, the
//! ingestion server and the result processor, plus a Result alias.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for displacement-stream operations
#[derive(Error, Debug)]
pub enum StreamError {
    /// The external build returned a non-zero exit code
    #[error("Build failed with exit code {exit_code}")]
    BuildFailed { exit_code: i32 },

    /// The worker returned a non-zero exit code
    #[error("Worker failed with exit code {exit_code}")]
    ExecuteFailed { exit_code: i32 },

    /// An external command could not be started at all
    #[error("Failed to start {program}: {source}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The run was aborted before the worker could be started
    #[error("Run aborted before the worker was started")]
    Aborted,

    /// Accept/read failures on the ingestion socket
    #[error("Connection error: {0}")]
    Connection(String),

    /// A point record that could not be decoded
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// The processed result could not be written
    #[error("Failed to write output {path:?}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<StreamError>,
    },
}

impl StreamError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        StreamError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The process exit code carried by a build or execute failure, looking
    /// through any context wrappers.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            StreamError::BuildFailed { exit_code } | StreamError::ExecuteFailed { exit_code } => {
                Some(*exit_code)
            }
            StreamError::WithContext { source, .. } => source.exit_code(),
            _ => None,
        }
    }
}

/// Result type alias for displacement-stream operations
pub type Result<T> = std::result::Result<T, StreamError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| StreamError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| StreamError::Io(e).with_context(f()))
    }
}
