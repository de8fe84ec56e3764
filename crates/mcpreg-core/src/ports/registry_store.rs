//! Registry store trait and error types.
//!
//! This module defines the persistence abstraction for the server registry.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::RegistryDocument;

/// Errors raised by a registry store.
///
/// A missing registry file is not an error; it loads as an empty document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the registry file failed.
    #[error("Failed to access registry file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The registry file exists but is not a valid registry document.
    #[error("Failed to parse registry file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Another writer saved the registry since this copy was loaded.
    #[error("Registry was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict { expected: u64, found: u64 },
}

/// Whole-document persistence for the server registry.
///
/// # Design Rules
///
/// - `load()` returns the entire document; callers mutate it in memory
/// - `save()` replaces the entire document, never merges
/// - `save()` rejects a document whose `version` no longer matches storage,
///   and returns the new version on success
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Load the full registry document.
    ///
    /// # Errors
    ///
    /// - `Io` for read failures other than the file being absent
    /// - `Parse` for malformed content
    async fn load(&self) -> Result<RegistryDocument, StoreError>;

    /// Persist the full registry document.
    ///
    /// # Errors
    ///
    /// - `VersionConflict` if storage moved past `doc.version`
    /// - `Io` for write failures
    async fn save(&self, doc: &RegistryDocument) -> Result<u64, StoreError>;
}
