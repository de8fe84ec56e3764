//! Registry file location.
//!
//! Resolution order:
//! 1. An explicit path (e.g. the `--registry` flag)
//! 2. `MCPREG_REGISTRY` environment variable
//! 3. `MCPREG_DATA_DIR/servers.json`
//! 4. `<system config dir>/mcpreg/servers.json`

mod error;

use std::env;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use error::PathError;

/// Environment variable naming the registry file directly.
pub const REGISTRY_ENV: &str = "MCPREG_REGISTRY";

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "MCPREG_DATA_DIR";

/// File name of the registry inside a data directory.
pub const REGISTRY_FILE_NAME: &str = "servers.json";

/// Where the registry path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryPathSource {
    Explicit,
    RegistryEnv,
    DataDirEnv,
    SystemDefault,
}

/// A resolved registry location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryPath {
    pub path: PathBuf,
    pub source: RegistryPathSource,
}

/// Resolve the registry file path from the process environment.
pub fn resolve_registry_path(explicit: Option<&str>) -> Result<RegistryPath, PathError> {
    let resolved = resolve_from(
        explicit,
        env::var(REGISTRY_ENV).ok().as_deref(),
        env::var(DATA_DIR_ENV).ok().as_deref(),
        dirs::config_dir(),
    )?;
    tracing::debug!(
        path = %resolved.path.display(),
        source = ?resolved.source,
        "Resolved registry path"
    );
    Ok(resolved)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn resolve_from(
    explicit: Option<&str>,
    registry_env: Option<&str>,
    data_dir_env: Option<&str>,
    config_dir: Option<PathBuf>,
) -> Result<RegistryPath, PathError> {
    let (path, source) = if let Some(raw) = non_empty(explicit) {
        (normalize_user_path(raw)?, RegistryPathSource::Explicit)
    } else if let Some(raw) = non_empty(registry_env) {
        (normalize_user_path(raw)?, RegistryPathSource::RegistryEnv)
    } else if let Some(raw) = non_empty(data_dir_env) {
        (
            normalize_user_path(raw)?.join(REGISTRY_FILE_NAME),
            RegistryPathSource::DataDirEnv,
        )
    } else {
        let base = config_dir.ok_or(PathError::NoConfigDir)?;
        (
            base.join("mcpreg").join(REGISTRY_FILE_NAME),
            RegistryPathSource::SystemDefault,
        )
    };

    if path.is_dir() {
        return Err(PathError::IsADirectory(path));
    }

    Ok(RegistryPath { path, source })
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed == "~" || trimmed.starts_with("~/") {
        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        if trimmed == "~" {
            home
        } else {
            home.join(trimmed.trim_start_matches("~/"))
        }
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}

/// Directory that will contain the registry file.
pub fn registry_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}
