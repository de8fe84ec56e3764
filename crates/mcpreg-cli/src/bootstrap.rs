//! CLI bootstrap - the composition root.
//!
//! This is the ONLY place where infrastructure is wired together for the
//! CLI: registry path resolution, the JSON file store, the probe
//! orchestrator and the registry service. Handlers receive the composed
//! `CliContext` and never construct adapters themselves.

use std::sync::Arc;

use mcpreg_core::{
    PlatformFamily, ProbeSettings, RegistryPath, resolve_registry_path, validate_settings,
};
use mcpreg_probe::{ProbeOrchestrator, RegistryService};
use mcpreg_store::JsonRegistryStore;

use crate::error::CliError;
use crate::presentation::OutputMode;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Registry path from `--registry`, if given.
    pub registry: Option<String>,
    /// Probe settings after flag overrides.
    pub settings: ProbeSettings,
    pub output: OutputMode,
}

impl CliConfig {
    /// Create config with default settings and text output.
    pub fn with_defaults() -> Self {
        Self {
            registry: None,
            settings: ProbeSettings::with_defaults(),
            output: OutputMode::Text,
        }
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub service: Arc<RegistryService>,
    pub registry: RegistryPath,
    pub output: OutputMode,
}

impl CliContext {
    pub fn service(&self) -> &RegistryService {
        &self.service
    }
}

/// Bootstrap the CLI application.
///
/// Resolves the registry location, validates probe settings, and wires
/// store → orchestrator → service.
pub fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    validate_settings(&config.settings)?;
    let registry = resolve_registry_path(config.registry.as_deref())?;
    tracing::debug!(
        path = %registry.path.display(),
        source = ?registry.source,
        "Using registry file"
    );

    let store = Arc::new(JsonRegistryStore::new(&registry.path));
    let orchestrator = Arc::new(ProbeOrchestrator::new(
        config.settings,
        PlatformFamily::current(),
    ));
    let service = Arc::new(RegistryService::new(store, orchestrator));

    Ok(CliContext {
        service,
        registry,
        output: config.output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpreg_core::{RegistryPathSource, SettingsError};

    #[test]
    fn test_bootstrap_uses_explicit_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.json");
        let config = CliConfig {
            registry: Some(path.to_string_lossy().into_owned()),
            ..CliConfig::with_defaults()
        };

        let ctx = bootstrap(config).unwrap();
        assert_eq!(ctx.registry.source, RegistryPathSource::Explicit);
        assert_eq!(ctx.registry.path, path);
    }

    #[test]
    fn test_bootstrap_rejects_bad_settings() {
        let config = CliConfig {
            registry: Some("/tmp/unused.json".to_string()),
            settings: ProbeSettings::with_defaults().with_batch_concurrency(0),
            ..CliConfig::with_defaults()
        };

        let Err(err) = bootstrap(config) else {
            panic!("expected settings error");
        };
        assert!(matches!(err, CliError::Settings(SettingsError::InvalidConcurrency(0))));
    }
}
