//! Live probe processes, keyed by server name.
//!
//! Each orchestrator owns one registry. An entry exists exactly while a
//! probe for that name is running; [`HandleGuard`] removes it on drop so
//! every exit path (success, timeout, spawn error, panic) cleans up.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Reference to a process spawned by a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessHandle {
    /// OS process id, `None` until the spawn succeeded.
    pub pid: Option<u32>,
    pub spawned_at: DateTime<Utc>,
}

/// Mutex-guarded map of in-flight probes. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct HandleRegistry {
    inner: Arc<Mutex<HashMap<String, ProcessHandle>>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ProcessHandle>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `name` for a new probe.
    ///
    /// Returns `None` if a probe for `name` is already running.
    pub fn try_reserve(&self, name: &str) -> Option<HandleGuard> {
        let mut map = self.lock();
        if map.contains_key(name) {
            return None;
        }
        map.insert(
            name.to_string(),
            ProcessHandle {
                pid: None,
                spawned_at: Utc::now(),
            },
        );
        Some(HandleGuard {
            registry: self.clone(),
            name: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<ProcessHandle> {
        self.lock().get(name).cloned()
    }

    /// Names with a probe currently running, sorted.
    pub fn in_flight(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Ownership of one registry entry; dropping it removes the entry.
#[derive(Debug)]
pub struct HandleGuard {
    registry: HandleRegistry,
    name: String,
}

impl HandleGuard {
    /// Record the spawned process against this entry.
    pub fn record_spawn(&self, pid: Option<u32>) {
        if let Some(handle) = self.registry.lock().get_mut(&self.name) {
            handle.pid = pid;
            handle.spawned_at = Utc::now();
        }
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_is_exclusive_per_name() {
        let registry = HandleRegistry::new();
        let first = registry.try_reserve("fs");
        assert!(first.is_some());
        assert!(registry.try_reserve("fs").is_none());
        assert!(registry.try_reserve("git").is_some());
    }

    #[test]
    fn test_drop_removes_entry() {
        let registry = HandleRegistry::new();
        {
            let guard = registry.try_reserve("fs").unwrap();
            guard.record_spawn(Some(4242));
            assert_eq!(registry.get("fs").unwrap().pid, Some(4242));
            assert_eq!(registry.in_flight(), vec!["fs"]);
        }
        assert!(registry.is_empty());
        assert!(registry.try_reserve("fs").is_some());
    }

    #[test]
    fn test_clones_share_state() {
        let registry = HandleRegistry::new();
        let other = registry.clone();
        let _guard = registry.try_reserve("fs").unwrap();
        assert_eq!(other.len(), 1);
    }
}
