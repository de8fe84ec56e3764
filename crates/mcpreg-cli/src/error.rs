//! CLI-specific error types.

use thiserror::Error;

use mcpreg_core::{PathError, RegistryError, SettingsError};

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Registry operation failed (unknown name, conflict, invalid input, storage).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Probe flags produced unusable settings.
    #[error("Invalid probe settings: {0}")]
    Settings(#[from] SettingsError),

    /// The registry file location could not be determined.
    #[error("Cannot resolve registry path: {0}")]
    Path(#[from] PathError),

    /// The command ran and already printed its result, which is a failure
    /// (failed probe, invalid definition).
    #[error("{0}")]
    Failed(String),
}

impl CliError {
    /// Whether the command already reported this failure to the user.
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_errors_keep_their_message() {
        let err = CliError::from(RegistryError::NotFound("fs".to_string()));
        assert_eq!(err.to_string(), "MCP server not found: fs");
        assert!(!err.is_reported());
    }

    #[test]
    fn test_failed_is_reported() {
        assert!(CliError::Failed("probe failed".to_string()).is_reported());
    }
}
