//! High-level registry service.
//!
//! This is the programmatic surface the CLI (or any other front end) talks
//! to: CRUD over the registry file plus probing, with the last-known
//! connectivity of each server kept in memory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use mcpreg_core::{
    BatchReport, ProbeOutcome, ProbeResult, RegistryDocument, RegistryError, RegistryStore,
    ServerDefinition, ServerDraft, ServerRecord, ServerStatus, StoreError, ValidationReport,
};

use crate::batch::BatchProbeRunner;
use crate::orchestrator::ProbeOrchestrator;

/// Read-modify-write attempts before a version conflict is surfaced.
const MAX_WRITE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Default)]
struct StatusEntry {
    status: ServerStatus,
    last_probed_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Registry CRUD plus probing, with runtime status per server.
pub struct RegistryService {
    store: Arc<dyn RegistryStore>,
    orchestrator: Arc<ProbeOrchestrator>,
    statuses: RwLock<HashMap<String, StatusEntry>>,
}

impl RegistryService {
    /// Create a new service with injected dependencies.
    pub fn new(store: Arc<dyn RegistryStore>, orchestrator: Arc<ProbeOrchestrator>) -> Self {
        Self {
            store,
            orchestrator,
            statuses: RwLock::new(HashMap::new()),
        }
    }

    pub const fn orchestrator(&self) -> &Arc<ProbeOrchestrator> {
        &self.orchestrator
    }

    async fn record(&self, name: String, config: ServerDefinition) -> ServerRecord {
        let entry = self.statuses.read().await.get(&name).cloned().unwrap_or_default();
        ServerRecord {
            name,
            config,
            status: entry.status,
            last_probed_at: entry.last_probed_at,
            last_error: entry.last_error,
        }
    }

    async fn set_status(&self, name: &str, entry: StatusEntry) {
        self.statuses.write().await.insert(name.to_string(), entry);
    }

    /// Record probe outcomes for servers that are still registered.
    ///
    /// The status lock is held across the registry reload, so a concurrent
    /// `remove` either runs first and the entry is skipped, or clears the
    /// entry after it is written.
    async fn record_results<'a, I>(&self, results: I)
    where
        I: IntoIterator<Item = (&'a str, &'a ProbeResult)>,
    {
        let mut statuses = self.statuses.write().await;
        let doc = match self.store.load().await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "Could not reload registry, probe status not recorded");
                return;
            }
        };
        for (name, result) in results {
            // The probe that holds the slot reports for both.
            if result.outcome == ProbeOutcome::AlreadyInFlight {
                continue;
            }
            if !doc.contains(name) {
                tracing::debug!(server_name = %name, "Server removed while probing, status dropped");
                continue;
            }
            let status = if result.success {
                ServerStatus::Connected
            } else {
                ServerStatus::Failed
            };
            statuses.insert(
                name.to_string(),
                StatusEntry {
                    status,
                    last_probed_at: Some(Utc::now()),
                    last_error: result.error.clone(),
                },
            );
        }
    }

    /// Load, apply `mutation`, save; retry from a fresh load if another
    /// writer saved in between.
    async fn mutate<F>(&self, mut mutation: F) -> Result<u64, RegistryError>
    where
        F: FnMut(&mut RegistryDocument) -> Result<(), RegistryError>,
    {
        let mut attempt = 1;
        loop {
            let mut doc = self.store.load().await?;
            mutation(&mut doc)?;
            match self.store.save(&doc).await {
                Ok(version) => return Ok(version),
                Err(StoreError::VersionConflict { expected, found })
                    if attempt < MAX_WRITE_ATTEMPTS =>
                {
                    tracing::debug!(attempt, expected, found, "Registry changed underneath us, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// All servers, ordered by name.
    pub async fn list(&self) -> Result<Vec<ServerRecord>, RegistryError> {
        let doc = self.store.load().await?;
        let mut records = Vec::with_capacity(doc.len());
        for (name, definition) in doc.servers {
            records.push(self.record(name, definition).await);
        }
        Ok(records)
    }

    /// Get a server by name.
    pub async fn get(&self, name: &str) -> Result<ServerRecord, RegistryError> {
        let mut doc = self.store.load().await?;
        let definition = doc
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        Ok(self.record(name.to_string(), definition).await)
    }

    /// Validate and register a new server.
    ///
    /// The command line is translated for the orchestrator's platform before
    /// it is stored, so the file holds exactly what will be executed.
    pub async fn add(&self, draft: ServerDraft) -> Result<ServerRecord, RegistryError> {
        let mut config = draft.into_config().map_err(RegistryError::Invalid)?;
        if let Some(command) = config.definition.command.as_deref() {
            let (command, args) = self
                .orchestrator
                .platform()
                .translate(command, &config.definition.args);
            config.definition.command = Some(command);
            config.definition.args = args;
        }

        let name = config.name.clone();
        let version = self
            .mutate(|doc| {
                if doc.contains(&name) {
                    return Err(RegistryError::Conflict(name.clone()));
                }
                doc.insert(config.clone());
                Ok(())
            })
            .await?;

        self.set_status(
            &name,
            StatusEntry {
                status: ServerStatus::Testing,
                ..StatusEntry::default()
            },
        )
        .await;

        tracing::info!(
            server_name = %name,
            transport = %config.transport(),
            version,
            "Added MCP server"
        );
        Ok(ServerRecord::new(name, config.definition, ServerStatus::Testing))
    }

    /// Remove a server by name.
    pub async fn remove(&self, name: &str) -> Result<(), RegistryError> {
        self.mutate(|doc| {
            doc.remove(name)
                .map(|_| ())
                .ok_or_else(|| RegistryError::NotFound(name.to_string()))
        })
        .await?;
        self.statuses.write().await.remove(name);

        tracing::info!(server_name = %name, "Removed MCP server");
        Ok(())
    }

    /// Probe one registered server and record the outcome.
    pub async fn probe(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<ProbeResult, RegistryError> {
        let config = self
            .store
            .load()
            .await?
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        let result = self.orchestrator.probe(&config, timeout).await;
        self.record_results([(name, &result)]).await;
        Ok(result)
    }

    /// Probe every registered server and record each outcome.
    pub async fn test_all(&self, timeout: Option<Duration>) -> Result<BatchReport, RegistryError> {
        let runner = BatchProbeRunner::new(Arc::clone(&self.store), Arc::clone(&self.orchestrator));
        let report = runner.test_all(timeout).await?;
        self.record_results(
            report
                .results
                .iter()
                .map(|(name, result)| (name.as_str(), result)),
        )
        .await;
        Ok(report)
    }

    /// Check a draft without storing it.
    pub fn validate(&self, draft: &ServerDraft) -> ValidationReport {
        mcpreg_core::validate(draft)
    }
}
