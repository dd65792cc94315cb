//! Error types for the sync engine.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during a sync run.
///
/// Cancellation is not an error: a user choosing to cancel at the conflict
/// prompt is reported as a successful early termination via
/// [`crate::SyncOutcome::Canceled`].
#[derive(Error, Debug)]
pub enum SyncError {
    /// A subprocess exited with a non-zero status. Carries the captured
    /// combined output so the caller can show the user what went wrong.
    #[error("command failed: {command}\n{output}")]
    Command {
        /// The command line that was executed.
        command: String,
        /// Captured stdout and stderr of the failed process.
        output: String,
    },

    /// Filesystem error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// No cloud remote has been configured yet.
    #[error("cloud remote not configured")]
    RemoteNotConfigured,

    /// The save root could not be determined on this platform.
    #[error("save root not found: {0}")]
    SaveRootNotFound(String),

    /// The persisted configuration could not be read or written.
    #[error("configuration error at {path}: {message}")]
    Config {
        /// Path of the config file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
}

impl SyncError {
    /// Creates a command failure from a command line and its captured output.
    pub fn command(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Creates a config error for the given file.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}
