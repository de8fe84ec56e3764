//! JSON file implementation of the registry store.
//!
//! The whole registry lives in one pretty-printed JSON document. Writes go to
//! a temporary sibling file that is renamed over the target, so readers never
//! observe a half-written registry.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use mcpreg_core::{RegistryDocument, RegistryStore, StoreError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Load a registry document from `path`.
///
/// A missing (or blank) file yields the empty document.
pub async fn load_document(path: &Path) -> Result<RegistryDocument, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Registry file absent, using empty document");
            return Ok(RegistryDocument::empty());
        }
        Err(e) => return Err(io_error(path, e)),
    };

    if content.trim().is_empty() {
        return Ok(RegistryDocument::empty());
    }

    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a document exactly as it is written to disk.
pub fn render_document(doc: &RegistryDocument) -> Result<String, serde_json::Error> {
    let mut rendered = serde_json::to_string_pretty(doc)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Write `doc` to `path`, replacing the file in full.
///
/// Creates the parent directory if needed. The write is atomic with respect
/// to readers: content goes to a temporary file that is then renamed.
pub async fn save_document(path: &Path, doc: &RegistryDocument) -> Result<(), StoreError> {
    let rendered = render_document(doc).map_err(|e| io_error(path, e.into()))?;

    let parent = mcpreg_core::paths::registry_dir(path).unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| io_error(parent, e))?;

    let temp_path = temp_path_for(path, parent);
    if let Err(e) = write_synced(&temp_path, rendered.as_bytes()).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(io_error(&temp_path, e));
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(io_error(path, e));
    }

    tracing::debug!(
        path = %path.display(),
        servers = doc.len(),
        version = doc.version,
        "Saved registry document"
    );
    Ok(())
}

fn temp_path_for(path: &Path, parent: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map_or_else(|| "registry".into(), |n| n.to_string_lossy());
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    parent.join(format!(".{file_name}.{}.{seq}.tmp", std::process::id()))
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Registry store backed by a single JSON file.
pub struct JsonRegistryStore {
    path: PathBuf,
    /// Serializes check-then-write within this process.
    write_lock: Mutex<()>,
}

impl JsonRegistryStore {
    /// Create a store for the registry file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RegistryStore for JsonRegistryStore {
    async fn load(&self) -> Result<RegistryDocument, StoreError> {
        load_document(&self.path).await
    }

    async fn save(&self, doc: &RegistryDocument) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;

        let found = load_document(&self.path).await?.version;
        if found != doc.version {
            tracing::warn!(
                path = %self.path.display(),
                expected = doc.version,
                found,
                "Rejected registry save from a stale copy"
            );
            return Err(StoreError::VersionConflict {
                expected: doc.version,
                found,
            });
        }

        let mut next = doc.clone();
        next.version = doc.version + 1;
        save_document(&self.path, &next).await?;
        Ok(next.version)
    }
}
