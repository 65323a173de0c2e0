//! Error types for config drive discovery.

use thiserror::Error;

/// Result alias used across the workspace.
pub type ConfigDriveResult<T> = Result<T, ConfigDriveError>;

/// Errors surfaced by config drive discovery.
///
/// A probe that simply finds nothing is not an error; it is reported as
/// `Ok(false)`. Everything in here is a hard failure for the caller.
#[derive(Debug, Error)]
pub enum ConfigDriveError {
    /// An OS facility could not be invoked or reported failure.
    #[error("execution error: {0}")]
    Execution(String),

    /// A mount or unmount command failed.
    #[error("mount error: {0}")]
    Mount(String),

    /// Copying the located tree to the target failed.
    #[error("copy error: {0}")]
    Copy(String),

    /// Scratch directory or other local filesystem bookkeeping failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("config error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ConfigDriveError {
    /// Whether this error came from the mount lifecycle.
    ///
    /// Mount failures stop the probe chain; callers use this to tell a
    /// resource-state problem apart from a failed copy.
    pub fn is_mount(&self) -> bool {
        matches!(self, ConfigDriveError::Mount(_))
    }

    pub fn is_copy(&self) -> bool {
        matches!(self, ConfigDriveError::Copy(_))
    }
}
