//! MCP server registry domain types.
//!
//! These types represent tool-server definitions and probe results,
//! independent of any infrastructure concerns (files, processes, sockets).
//!
//! # Design
//!
//! - `ServerDefinition` - A stored entry (transport, command/args/env or url/headers)
//! - `ServerConfig` - A definition together with its unique name
//! - `ServerDraft` - Loose user input, checked by the validator
//! - `ServerRecord` - A definition plus in-memory connectivity status
//! - `RegistryDocument` - The whole persisted registry
//! - `ProbeResult` - Steps and terminal outcome of one probe

pub mod probe;
pub mod registry;
pub mod server;

pub use probe::{
    BatchReport, BatchSummary, ProbeOutcome, ProbeResult, ProbeStep, ServerIdentity, StepStatus,
};
pub use registry::RegistryDocument;
pub use server::{
    ServerConfig, ServerDefinition, ServerDraft, ServerRecord, ServerStatus, TransportKind,
    UnknownTransport,
};
