//! In-memory registry store for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use mcpreg_core::{RegistryDocument, RegistryStore, StoreError};

/// Keeps the document in memory and enforces the same version check as the
/// file store.
#[derive(Default)]
pub struct MemoryStore {
    doc: Mutex<RegistryDocument>,
    /// Number of upcoming saves that fail as if another writer got there first.
    conflicts: AtomicUsize,
}

impl MemoryStore {
    pub fn with_document(doc: RegistryDocument) -> Self {
        Self {
            doc: Mutex::new(doc),
            conflicts: AtomicUsize::new(0),
        }
    }

    pub fn fail_next_saves_with_conflict(&self, count: usize) {
        self.conflicts.store(count, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> RegistryDocument {
        self.doc.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn load(&self) -> Result<RegistryDocument, StoreError> {
        Ok(self.doc.lock().unwrap().clone())
    }

    async fn save(&self, doc: &RegistryDocument) -> Result<u64, StoreError> {
        let mut stored = self.doc.lock().unwrap();
        let pending = self.conflicts.load(Ordering::SeqCst);
        if pending > 0 {
            self.conflicts.store(pending - 1, Ordering::SeqCst);
            // Simulate a concurrent writer bumping the version.
            stored.version += 1;
        }
        if stored.version != doc.version {
            return Err(StoreError::VersionConflict {
                expected: doc.version,
                found: stored.version,
            });
        }
        let mut next = doc.clone();
        next.version = doc.version + 1;
        *stored = next;
        Ok(stored.version)
    }
}

/// Parse a pid printed by a test script.
#[cfg(unix)]
pub fn pid_from(text: &str) -> i32 {
    text.trim().parse().unwrap()
}

/// Whether `pid` is still a live process. Zombies awaiting their reaper
/// count as gone.
#[cfg(unix)]
pub fn is_running(pid: i32) -> bool {
    if let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        // The state letter follows the parenthesised command name.
        return stat
            .rsplit_once(") ")
            .is_some_and(|(_, rest)| !rest.starts_with('Z'));
    }
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
}

/// Wait up to two seconds for `pid` to disappear.
#[cfg(unix)]
pub async fn wait_until_gone(pid: i32) -> bool {
    for _ in 0..100 {
        if !is_running(pid) {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    false
}
