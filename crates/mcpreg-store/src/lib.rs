//! JSON file persistence for the mcpreg server registry.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod json_store;

pub use json_store::{JsonRegistryStore, load_document, render_document, save_document};
