//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the probing engine needs from infrastructure
//! without depending on a concrete storage backend.

mod registry_error;
mod registry_store;

pub use registry_error::RegistryError;
pub use registry_store::{RegistryStore, StoreError};
