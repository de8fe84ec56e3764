//! Path-related error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving the registry location.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the system configuration directory.
    #[error("Cannot determine system configuration directory")]
    NoConfigDir,

    /// Could not determine the user's home directory.
    #[error("Cannot determine home directory")]
    NoHomeDir,

    /// An empty path was provided.
    #[error("Path cannot be empty")]
    EmptyPath,

    /// A path was expected to be a file but is a directory.
    #[error("{0} is a directory, expected a registry file")]
    IsADirectory(PathBuf),

    /// Failed to get the current working directory.
    #[error("Cannot determine current directory: {0}")]
    CurrentDirError(String),
}
