//! Probe every registered server.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};

use mcpreg_core::{BatchReport, RegistryStore, ServerConfig, StoreError};

use crate::orchestrator::ProbeOrchestrator;

/// Loads the registry and probes each server with bounded concurrency.
pub struct BatchProbeRunner {
    store: Arc<dyn RegistryStore>,
    orchestrator: Arc<ProbeOrchestrator>,
}

impl BatchProbeRunner {
    pub fn new(store: Arc<dyn RegistryStore>, orchestrator: Arc<ProbeOrchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Probe every server in the registry.
    ///
    /// Each probe gets its own `timeout`; one slow server does not shorten
    /// the budget of the others.
    pub async fn test_all(&self, timeout: Option<Duration>) -> Result<BatchReport, StoreError> {
        let doc = self.store.load().await?;
        Ok(self.probe_configs(doc.configs(), timeout).await)
    }

    /// Probe an explicit set of servers.
    pub async fn probe_configs(
        &self,
        configs: Vec<ServerConfig>,
        timeout: Option<Duration>,
    ) -> BatchReport {
        let concurrency = self.orchestrator.settings().batch_concurrency.max(1);
        tracing::info!(servers = configs.len(), concurrency, "Probing all MCP servers");

        let orchestrator = &self.orchestrator;
        let results: Vec<_> = stream::iter(configs)
            .map(|config| async move {
                let result = orchestrator.probe(&config, timeout).await;
                (config.name, result)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let report = BatchReport::from_results(results);
        tracing::info!(
            total = report.summary.total,
            connected = report.summary.connected,
            failed = report.summary.failed,
            "Batch probe finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use mcpreg_core::{
        HandshakeStrategy, PlatformFamily, ProbeOutcome, ProbeSettings, RegistryDocument,
    };

    fn runner(doc: RegistryDocument, concurrency: usize) -> BatchProbeRunner {
        let settings = ProbeSettings::with_defaults()
            .with_handshake(HandshakeStrategy::fixed_delay(Duration::from_millis(100)))
            .with_batch_concurrency(concurrency);
        BatchProbeRunner::new(
            Arc::new(MemoryStore::with_document(doc)),
            Arc::new(ProbeOrchestrator::new(settings, PlatformFamily::Unix)),
        )
    }

    #[tokio::test]
    async fn test_empty_registry_yields_empty_report() {
        let report = runner(RegistryDocument::empty(), 4).test_all(None).await.unwrap();
        assert_eq!(report.summary.total, 0);
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_every_server_gets_a_result() {
        let mut doc = RegistryDocument::empty();
        doc.insert(ServerConfig::new_stdio("alive", "sleep", vec!["30".to_string()]));
        doc.insert(ServerConfig::new_stdio("missing", "mcpreg-no-such-binary", vec![]));
        doc.insert(ServerConfig::new_stdio("blank", " ", vec![]));

        for concurrency in [1, 4] {
            let report = runner(doc.clone(), concurrency)
                .test_all(Some(Duration::from_secs(5)))
                .await
                .unwrap();

            assert_eq!(report.summary.total, 3);
            assert_eq!(report.summary.connected, 1);
            assert_eq!(report.summary.failed, 2);
            assert_eq!(report.results["alive"].outcome, ProbeOutcome::Succeeded);
            assert_eq!(report.results["missing"].outcome, ProbeOutcome::SpawnFailed);
            assert_eq!(report.results["blank"].outcome, ProbeOutcome::Misconfigured);
        }
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_probes_run_concurrently() {
        let mut doc = RegistryDocument::empty();
        for i in 0..4 {
            doc.insert(ServerConfig::new_stdio(format!("s{i}"), "sleep", vec!["30".to_string()]));
        }
        let settings = ProbeSettings::with_defaults()
            .with_handshake(HandshakeStrategy::fixed_delay(Duration::from_millis(600)))
            .with_batch_concurrency(4);
        let runner = BatchProbeRunner::new(
            Arc::new(MemoryStore::with_document(doc)),
            Arc::new(ProbeOrchestrator::new(settings, PlatformFamily::Unix)),
        );

        let started = std::time::Instant::now();
        let report = runner.test_all(Some(Duration::from_secs(5))).await.unwrap();

        assert_eq!(report.summary.connected, 4);
        // Four sequential probes would need at least 2.4s.
        assert!(started.elapsed() < Duration::from_millis(2_400));
    }
}
