//! The persisted registry document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::server::{ServerConfig, ServerDefinition};

/// Whole-file registry of server definitions.
///
/// Servers are kept in a `BTreeMap` so serialization is deterministic.
/// `version` is bumped by the store on every successful save and is used
/// to detect writers working from a stale copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub servers: BTreeMap<String, ServerDefinition>,
}

impl RegistryDocument {
    /// An empty document, as used when no file exists yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.servers.contains_key(name)
    }

    /// Look up a server by name.
    pub fn get(&self, name: &str) -> Option<ServerConfig> {
        self.servers.get(name).map(|definition| ServerConfig {
            name: name.to_string(),
            definition: definition.clone(),
        })
    }

    /// Insert or replace a server entry. Returns the previous definition.
    pub fn insert(&mut self, config: ServerConfig) -> Option<ServerDefinition> {
        self.servers.insert(config.name, config.definition)
    }

    /// Remove a server entry. Returns the removed definition.
    pub fn remove(&mut self, name: &str) -> Option<ServerDefinition> {
        self.servers.remove(name)
    }

    /// All servers as named configs, ordered by name.
    pub fn configs(&self) -> Vec<ServerConfig> {
        self.servers
            .iter()
            .map(|(name, definition)| ServerConfig {
                name: name.clone(),
                definition: definition.clone(),
            })
            .collect()
    }
}
