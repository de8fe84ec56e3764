//! Registry service error types.

use thiserror::Error;

use super::StoreError;
use crate::validation::ValidationReport;

/// Errors surfaced by registry operations.
///
/// Probe failures are not errors; they come back as `ProbeResult` data.
/// Only unknown names, rejected input and storage failures propagate here.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No server is registered under this name.
    #[error("MCP server not found: {0}")]
    NotFound(String),

    /// A server with this name is already registered.
    #[error("MCP server already exists: {0}")]
    Conflict(String),

    /// The submitted definition failed validation.
    #[error("Invalid MCP server configuration: {0}")]
    Invalid(ValidationReport),

    /// The registry file could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistryError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
