//! Probe result types.
//!
//! A probe produces a [`ProbeResult`]: an ordered list of steps plus the
//! terminal [`ProbeOutcome`] that decided it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Status of a single probe step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
    Pending,
}

/// One diagnostic step of a probe, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeStep {
    pub name: String,
    pub status: StepStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ProbeStep {
    pub fn success(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, StepStatus::Success, message)
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, StepStatus::Error, message)
    }

    pub fn pending(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, StepStatus::Pending, message)
    }

    fn new(name: impl Into<String>, status: StepStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
            details: None,
        }
    }

    /// Attach free-form diagnostic details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Terminal state that decided a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Handshake completed (stdio) or endpoint answered (http/sse)
    Succeeded,
    /// Caller timeout elapsed first
    TimedOut,
    /// The process could not be created
    SpawnFailed,
    /// The process exited before the handshake completed
    Exited,
    /// The process answered, but not with a valid `initialize` response
    HandshakeFailed,
    /// The endpoint could not be reached or answered with a failing status
    Unreachable,
    /// The definition is missing fields required to probe it
    Misconfigured,
    /// Another probe for the same server is still running
    AlreadyInFlight,
}

impl ProbeOutcome {
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// What a server reported about itself during the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerIdentity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub protocol_version: String,
}

/// Result of one probe call. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub success: bool,
    pub outcome: ProbeOutcome,
    pub steps: Vec<ProbeStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerIdentity>,
}

impl ProbeResult {
    /// Build a successful result.
    pub const fn succeeded(steps: Vec<ProbeStep>, latency_ms: u64) -> Self {
        Self {
            success: true,
            outcome: ProbeOutcome::Succeeded,
            steps,
            error: None,
            latency_ms: Some(latency_ms),
            server: None,
        }
    }

    /// Build a failed result.
    pub fn failed(outcome: ProbeOutcome, steps: Vec<ProbeStep>, error: impl Into<String>) -> Self {
        debug_assert!(!outcome.is_success());
        Self {
            success: false,
            outcome,
            steps,
            error: Some(error.into()),
            latency_ms: None,
            server: None,
        }
    }

    /// Attach the identity reported by the server.
    #[must_use]
    pub fn with_server(mut self, server: ServerIdentity) -> Self {
        self.server = Some(server);
        self
    }
}

/// Aggregate counts for a batch probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub connected: usize,
    pub failed: usize,
}

/// Result of probing every registered server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: BTreeMap<String, ProbeResult>,
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Collect per-server results and compute the summary.
    pub fn from_results(results: impl IntoIterator<Item = (String, ProbeResult)>) -> Self {
        let results: BTreeMap<String, ProbeResult> = results.into_iter().collect();
        let connected = results.values().filter(|r| r.success).count();
        let summary = BatchSummary {
            total: results.len(),
            connected,
            failed: results.len() - connected,
        };
        Self { results, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serializes_camel_case() {
        let result = ProbeResult::succeeded(
            vec![ProbeStep::success("Testing connection", "Connected")],
            42,
        );
        let json = serde_json::to_string(&result).unwrap();

        assert!(json.contains("\"latencyMs\":42"));
        assert!(json.contains("\"outcome\":\"succeeded\""));
        assert!(json.contains("\"status\":\"success\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_failed_result_carries_error() {
        let result = ProbeResult::failed(
            ProbeOutcome::TimedOut,
            vec![ProbeStep::error("Handshake", "Server did not respond within 100ms")],
            "Server did not respond within 100ms",
        );
        assert!(!result.success);
        assert_eq!(result.outcome, ProbeOutcome::TimedOut);
        assert!(result.latency_ms.is_none());
    }

    #[test]
    fn test_batch_summary_counts() {
        let ok = ProbeResult::succeeded(vec![], 1);
        let bad = ProbeResult::failed(ProbeOutcome::SpawnFailed, vec![], "boom");
        let report = BatchReport::from_results([
            ("a".to_string(), ok.clone()),
            ("b".to_string(), bad),
            ("c".to_string(), ok),
        ]);

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.connected, 2);
        assert_eq!(report.summary.failed, 1);
    }
}
