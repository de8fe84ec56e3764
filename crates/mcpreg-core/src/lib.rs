//! Core domain types, validation and ports for mcpreg.
//!
//! This crate has no knowledge of files, processes or sockets. It defines
//! what a tool-server definition is, how it is validated, how commands are
//! translated per platform, and the `RegistryStore` port that storage
//! adapters implement.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod paths;
pub mod platform;
pub mod ports;
pub mod settings;
pub mod validation;

// Re-export commonly used types for convenience
pub use domain::{
    BatchReport, BatchSummary, ProbeOutcome, ProbeResult, ProbeStep, RegistryDocument,
    ServerConfig, ServerDefinition, ServerDraft, ServerIdentity, ServerRecord, ServerStatus,
    StepStatus, TransportKind,
};
pub use paths::{PathError, RegistryPath, RegistryPathSource, resolve_registry_path};
pub use platform::{PlatformFamily, translate};
pub use ports::{RegistryError, RegistryStore, StoreError};
pub use settings::{
    DEFAULT_BATCH_CONCURRENCY, DEFAULT_HANDSHAKE_DELAY_MS, DEFAULT_PROBE_TIMEOUT_MS,
    HandshakeStrategy, ProbeSettings, SettingsError, validate_settings,
};
pub use validation::{FieldError, ValidationReport, is_valid_name, validate, validate_config};
