//! Error types and exit codes for the visitbench harness.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad flag values from the caller)
//! - `3`: Configuration errors (unreadable or malformed config, bad visitor declarations)
//! - `4`: No input (no source file under the roots could be parsed)
//! - `10`: Internal errors (I/O failures, thread pool setup, unexpected state)

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use visitbench_core::ConfigError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable error codes used as process exit codes and in JSON error output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller.
    InvalidArguments = 2,
    /// Configuration file or visitor declarations are invalid.
    ConfigurationError = 3,
    /// Nothing to benchmark.
    NoInput = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Every way a benchmark run can fail.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`BenchConfig`](crate::config::BenchConfig).
    #[error("failed to parse config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A visitor declaration was rejected at registration.
    #[error("invalid visitor configuration: {0}")]
    Visitors(#[from] ConfigError),

    /// No source file could be parsed.
    #[error("no parseable source files found under {roots}")]
    NoInput { roots: String },

    /// I/O failure outside config loading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl BenchError {
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        BenchError::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        BenchError::InternalError {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&BenchError> for OutputErrorCode {
    fn from(err: &BenchError) -> Self {
        match err {
            BenchError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            BenchError::ConfigRead { .. } => OutputErrorCode::ConfigurationError,
            BenchError::ConfigParse { .. } => OutputErrorCode::ConfigurationError,
            BenchError::Visitors(_) => OutputErrorCode::ConfigurationError,
            BenchError::NoInput { .. } => OutputErrorCode::NoInput,
            BenchError::Io(_) => OutputErrorCode::InternalError,
            BenchError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}
