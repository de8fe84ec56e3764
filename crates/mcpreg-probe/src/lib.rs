//! Probing engine for registered MCP servers.
//!
//! Spawns stdio servers and races their handshake against a timeout and
//! against process exit, checks http/sse endpoints, probes whole registries
//! with bounded concurrency, and exposes the [`RegistryService`] facade.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod batch;
pub mod handshake;
pub mod http;
pub mod orchestrator;
pub mod registry;
pub(crate) mod shutdown;
pub(crate) mod stderr;
pub mod service;

#[cfg(test)]
mod test_support;

// Dev-dependencies used only by integration tests
#[cfg(test)]
use mcpreg_store as _;

pub use batch::BatchProbeRunner;
pub use handshake::{HandshakeError, HandshakePhase, PROTOCOL_VERSION};
pub use orchestrator::ProbeOrchestrator;
pub use registry::{HandleGuard, HandleRegistry, ProcessHandle};
pub use service::RegistryService;
