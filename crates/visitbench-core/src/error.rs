//! Configuration errors raised while assembling a visitor set.

use thiserror::Error;

/// A broken visitor configuration.
///
/// These are fatal: they describe a visitor set that cannot be dispatched
/// correctly, not a recoverable per-node condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A visitor declared an explicit kind set with no kinds in it.
    #[error("visitor #{index} ({visitor}) declares an empty kind set")]
    EmptyKindSet { index: usize, visitor: &'static str },

    /// A shared dispatch table was bound to a visitor set of a different
    /// shape than the one trying to use it.
    #[error("shared dispatch table holds entries for {expected} visitors, got {found}")]
    SharedTableMismatch { expected: usize, found: usize },
}

/// Result alias for visitor set configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;
