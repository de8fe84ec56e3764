//! Probe orchestration.
//!
//! A stdio probe spawns the server and races three events:
//!
//! 1. the handshake completes (protocol exchange or fixed delay)
//! 2. the caller's timeout elapses
//! 3. the process exits on its own
//!
//! The first one decides the outcome. Both deadlines are measured from the
//! same spawn instant and the race is biased toward the handshake, so a
//! handshake that becomes ready exactly at the timeout still wins.

use std::fmt::Write as _;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::BufReader;
use tokio::process::{ChildStdin, ChildStdout, Command};
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until, timeout as within};

use mcpreg_core::{
    HandshakeStrategy, PlatformFamily, ProbeOutcome, ProbeResult, ProbeSettings, ProbeStep,
    ServerConfig, ServerIdentity,
};

use crate::handshake::{HandshakeError, HandshakePhase, perform_initialize};
use crate::http::{EndpointCheck, check_endpoint};
use crate::registry::{HandleGuard, HandleRegistry};
use crate::shutdown::{isolate, shutdown_tree};
use crate::stderr::{StderrTail, finish_reader};

pub const STEP_VALIDATE: &str = "Validating configuration";
pub const STEP_SPAWN: &str = "Starting server process";
pub const STEP_HANDSHAKE: &str = "Performing handshake";
pub const STEP_CONNECT: &str = "Testing connection";

/// How long to wait for an exit after the server closed its pipes.
const EXIT_SETTLE: Duration = Duration::from_millis(250);

/// How long to wait for the stderr reader to drain after the process stops.
const STDERR_DRAIN: Duration = Duration::from_millis(100);

/// Message for a probe that lost the race to the caller's timeout.
pub fn timeout_message(timeout: Duration) -> String {
    format!("Server did not respond within {}ms", timeout.as_millis())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

enum Race {
    Handshake(Result<Option<ServerIdentity>, HandshakeError>),
    TimedOut,
    Exited(io::Result<ExitStatus>),
}

/// Runs probes and owns the registry of in-flight probe processes.
#[derive(Debug, Clone)]
pub struct ProbeOrchestrator {
    settings: ProbeSettings,
    platform: PlatformFamily,
    handles: HandleRegistry,
}

impl ProbeOrchestrator {
    pub fn new(settings: ProbeSettings, platform: PlatformFamily) -> Self {
        Self {
            settings,
            platform,
            handles: HandleRegistry::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ProbeSettings::with_defaults(), PlatformFamily::current())
    }

    pub const fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    pub const fn platform(&self) -> PlatformFamily {
        self.platform
    }

    /// In-flight probes. Empty whenever no probe is running.
    pub const fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    /// Probe one server. Always resolves; failures are reported in the result.
    ///
    /// `timeout` defaults to the configured probe timeout.
    pub async fn probe(&self, config: &ServerConfig, timeout: Option<Duration>) -> ProbeResult {
        let timeout = timeout.unwrap_or_else(|| self.settings.default_timeout());
        tracing::debug!(
            server_name = %config.name,
            transport = %config.transport(),
            timeout_ms = millis(timeout),
            "Probing MCP server"
        );

        let result = self.run(config, timeout).await;

        if result.success {
            tracing::info!(
                server_name = %config.name,
                latency_ms = ?result.latency_ms,
                "MCP server probe succeeded"
            );
        } else {
            tracing::info!(
                server_name = %config.name,
                outcome = ?result.outcome,
                error = ?result.error,
                "MCP server probe failed"
            );
        }
        result
    }

    async fn run(&self, config: &ServerConfig, timeout: Duration) -> ProbeResult {
        let mut steps = Vec::new();

        let report = config.check();
        if !report.valid {
            let summary = report.summary();
            steps.push(ProbeStep::error(STEP_VALIDATE, summary.clone()));
            return ProbeResult::failed(ProbeOutcome::Misconfigured, steps, summary);
        }
        steps.push(ProbeStep::success(STEP_VALIDATE, "Configuration is valid"));

        let Some(guard) = self.handles.try_reserve(&config.name) else {
            let message = format!("A probe for '{}' is already running", config.name);
            let step_name = if config.transport().is_remote() {
                STEP_CONNECT
            } else {
                STEP_SPAWN
            };
            steps.push(ProbeStep::pending(step_name, message.clone()));
            return ProbeResult::failed(ProbeOutcome::AlreadyInFlight, steps, message);
        };

        if config.transport().is_remote() {
            self.probe_remote(config, timeout, steps).await
        } else {
            self.probe_stdio(config, timeout, steps, &guard).await
        }
    }

    async fn probe_remote(
        &self,
        config: &ServerConfig,
        timeout: Duration,
        mut steps: Vec<ProbeStep>,
    ) -> ProbeResult {
        let definition = &config.definition;
        let url = definition.url.as_deref().unwrap_or_default();

        match check_endpoint(config.transport(), url, &definition.headers, timeout).await {
            EndpointCheck::Reachable { status, latency_ms } => {
                steps.push(ProbeStep::success(
                    STEP_CONNECT,
                    format!("{url} answered with HTTP {status}"),
                ));
                ProbeResult::succeeded(steps, latency_ms)
            }
            EndpointCheck::Rejected { status } => {
                let message = format!("{url} answered with HTTP {status}");
                steps.push(ProbeStep::error(STEP_CONNECT, message.clone()));
                ProbeResult::failed(ProbeOutcome::Unreachable, steps, message)
            }
            EndpointCheck::TimedOut => {
                let message = timeout_message(timeout);
                steps.push(ProbeStep::error(STEP_CONNECT, message.clone()));
                ProbeResult::failed(ProbeOutcome::TimedOut, steps, message)
            }
            EndpointCheck::Failed(reason) => {
                let message = format!("Failed to connect to {url}: {reason}");
                steps.push(ProbeStep::error(STEP_CONNECT, message.clone()));
                ProbeResult::failed(ProbeOutcome::Unreachable, steps, message)
            }
        }
    }

    async fn probe_stdio(
        &self,
        config: &ServerConfig,
        timeout: Duration,
        mut steps: Vec<ProbeStep>,
        guard: &HandleGuard,
    ) -> ProbeResult {
        let definition = &config.definition;
        let command = definition.command.as_deref().unwrap_or_default();
        let (program, args) = self.platform.translate(command, &definition.args);
        let working_dir = definition
            .working_directory
            .as_deref()
            .filter(|d| !d.trim().is_empty());

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .envs(&definition.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        isolate(&mut cmd);

        let started = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(
                    server_name = %config.name,
                    command = %program,
                    error = %e,
                    "Failed to spawn MCP server"
                );
                let message = format!("Failed to start server: {e}");
                steps.push(
                    ProbeStep::error(STEP_SPAWN, message.clone())
                        .with_details(spawn_failure_details(&e, &program, &args, working_dir)),
                );
                return ProbeResult::failed(ProbeOutcome::SpawnFailed, steps, message);
            }
        };

        let pid = child.id();
        guard.record_spawn(pid);
        steps.push(ProbeStep::success(
            STEP_SPAWN,
            pid.map_or_else(
                || format!("Started {program}"),
                |pid| format!("Started {program} (pid {pid})"),
            ),
        ));

        let tail = StderrTail::new(self.settings.stderr_tail_lines);
        let stderr_reader = child.stderr.take().map(|stderr| tail.spawn_reader(stderr));

        let (phase_tx, phase_rx) = watch::channel(HandshakePhase::WaitingForBanner);
        let handshake = wait_for_handshake(
            self.settings.handshake,
            child.stdin.take(),
            child.stdout.take(),
            started,
            phase_tx,
        );

        let race = tokio::select! {
            biased;
            result = handshake => Race::Handshake(result),
            () = sleep_until(started + timeout) => Race::TimedOut,
            status = child.wait() => Race::Exited(status),
        };

        // Pipes closing right before an exit look like a handshake failure.
        let race = match race {
            Race::Handshake(Err(e @ (HandshakeError::Closed | HandshakeError::Io(_)))) => {
                match within(EXIT_SETTLE, child.wait()).await {
                    Ok(status) => Race::Exited(status),
                    Err(_) => Race::Handshake(Err(e)),
                }
            }
            other => other,
        };
        let latency_ms = millis(started.elapsed());

        // Also runs after an exit: the server may have left children behind.
        if let Err(e) = shutdown_tree(&mut child, pid, self.settings.shutdown_grace()).await {
            tracing::warn!(server_name = %config.name, error = %e, "Failed to stop probe process");
        }
        if let Some(reader) = stderr_reader {
            if !finish_reader(reader, STDERR_DRAIN).await {
                tracing::debug!(server_name = %config.name, "Stderr still open after shutdown, reader aborted");
            }
        }
        let stderr = tail.render();

        match race {
            Race::Handshake(Ok(identity)) => {
                let message = match (&identity, self.settings.handshake) {
                    (Some(identity), _) => format!(
                        "{} answered initialize (protocol {})",
                        identity.name, identity.protocol_version
                    ),
                    (None, HandshakeStrategy::FixedDelay { delay_ms }) => {
                        format!("Process still running after {delay_ms}ms")
                    }
                    (None, HandshakeStrategy::Protocol) => "Handshake completed".to_string(),
                };
                steps.push(ProbeStep::success(STEP_HANDSHAKE, message));
                let result = ProbeResult::succeeded(steps, latency_ms);
                match identity {
                    Some(identity) => result.with_server(identity),
                    None => result,
                }
            }
            Race::Handshake(Err(e)) => {
                let message = format!("Handshake failed: {e}");
                steps.push(with_stderr(ProbeStep::error(STEP_HANDSHAKE, message.clone()), stderr));
                ProbeResult::failed(ProbeOutcome::HandshakeFailed, steps, message)
            }
            Race::TimedOut => {
                let message = timeout_message(timeout);
                let mut details = format!("handshake phase: {}", *phase_rx.borrow());
                if let Some(stderr) = stderr {
                    let _ = write!(details, "\nstderr:\n{stderr}");
                }
                steps.push(ProbeStep::error(STEP_HANDSHAKE, message.clone()).with_details(details));
                ProbeResult::failed(ProbeOutcome::TimedOut, steps, message)
            }
            Race::Exited(status) => {
                let message = match status {
                    Ok(status) => format!("Server process exited before the handshake completed ({status})"),
                    Err(e) => format!("Lost track of server process: {e}"),
                };
                steps.push(with_stderr(ProbeStep::error(STEP_HANDSHAKE, message.clone()), stderr));
                ProbeResult::failed(ProbeOutcome::Exited, steps, message)
            }
        }
    }
}

impl Default for ProbeOrchestrator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// The handshake leg of the race.
///
/// Owns the child's stdio for its whole lifetime; many servers exit as soon
/// as stdin closes.
async fn wait_for_handshake(
    strategy: HandshakeStrategy,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    started: Instant,
    phase: watch::Sender<HandshakePhase>,
) -> Result<Option<ServerIdentity>, HandshakeError> {
    match strategy {
        HandshakeStrategy::FixedDelay { delay_ms } => {
            let _stdio = (stdin, stdout);
            sleep_until(started + Duration::from_millis(delay_ms)).await;
            phase.send_replace(HandshakePhase::Ready);
            Ok(None)
        }
        HandshakeStrategy::Protocol => {
            let (Some(mut stdin), Some(stdout)) = (stdin, stdout) else {
                return Err(HandshakeError::Protocol("Server stdio was not captured".to_string()));
            };
            perform_initialize(&mut stdin, BufReader::new(stdout), &phase)
                .await
                .map(Some)
        }
    }
}

fn with_stderr(step: ProbeStep, stderr: Option<String>) -> ProbeStep {
    match stderr {
        Some(stderr) => step.with_details(format!("stderr:\n{stderr}")),
        None => step,
    }
}

fn spawn_failure_details(
    err: &io::Error,
    program: &str,
    args: &[String],
    working_dir: Option<&str>,
) -> String {
    let mut details = format!("kind: {:?}", err.kind());
    if let Some(code) = err.raw_os_error() {
        let _ = write!(details, "\nos error: {code}");
    }
    let _ = write!(details, "\ncommand: {program}");
    if !args.is_empty() {
        let _ = write!(details, "\nargs: {}", args.join(" "));
    }
    if let Some(dir) = working_dir {
        let _ = write!(details, "\nworking directory: {dir}");
    }
    details
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::test_support::{pid_from, wait_until_gone};
    use mcpreg_core::StepStatus;

    fn orchestrator(handshake: HandshakeStrategy) -> ProbeOrchestrator {
        let mut settings = ProbeSettings::with_defaults().with_handshake(handshake);
        settings.shutdown_grace_ms = 500;
        ProbeOrchestrator::new(settings, PlatformFamily::Unix)
    }

    fn delay(ms: u64) -> HandshakeStrategy {
        HandshakeStrategy::fixed_delay(Duration::from_millis(ms))
    }

    fn sh(name: &str, script: &str) -> ServerConfig {
        ServerConfig::new_stdio(name, "sh", vec!["-c".to_string(), script.to_string()])
    }

    fn step_names(result: &ProbeResult) -> Vec<&str> {
        result.steps.iter().map(|s| s.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_invalid_config_is_misconfigured_without_spawning() {
        let orch = orchestrator(delay(100));
        let config = ServerConfig::new_stdio("broken", "   ", vec![]);

        let result = orch.probe(&config, None).await;

        assert_eq!(result.outcome, ProbeOutcome::Misconfigured);
        assert!(!result.success);
        assert_eq!(step_names(&result), vec![STEP_VALIDATE]);
        assert!(orch.handles().is_empty());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_timeout_shorter_than_handshake_times_out() {
        let orch = orchestrator(delay(1_000));
        let config = ServerConfig::new_stdio("slow", "sleep", vec!["30".to_string()]);

        let result = orch.probe(&config, Some(Duration::from_millis(150))).await;

        assert_eq!(result.outcome, ProbeOutcome::TimedOut);
        assert_eq!(result.error.as_deref(), Some("Server did not respond within 150ms"));
        let last = result.steps.last().unwrap();
        assert_eq!(last.status, StepStatus::Error);
        assert!(last.details.as_deref().unwrap().contains("waiting for banner"));
        assert!(orch.handles().is_empty());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_handshake_before_timeout_succeeds() {
        let orch = orchestrator(delay(100));
        let config = ServerConfig::new_stdio("fast", "sleep", vec!["30".to_string()]);

        let result = orch.probe(&config, Some(Duration::from_secs(3))).await;

        assert!(result.success, "{result:?}");
        assert_eq!(result.outcome, ProbeOutcome::Succeeded);
        assert!(result.latency_ms.unwrap() < 3_000);
        assert_eq!(step_names(&result), vec![STEP_VALIDATE, STEP_SPAWN, STEP_HANDSHAKE]);
        assert!(result.steps.iter().all(|s| s.status == StepStatus::Success));
        assert!(orch.handles().is_empty());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_equal_deadlines_favour_the_handshake() {
        let orch = orchestrator(delay(200));
        let config = ServerConfig::new_stdio("tie", "sleep", vec!["30".to_string()]);

        let result = orch.probe(&config, Some(Duration::from_millis(200))).await;

        assert_eq!(result.outcome, ProbeOutcome::Succeeded);
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let orch = orchestrator(delay(100));
        let config = ServerConfig::new_stdio("ghost", "mcpreg-no-such-binary", vec!["--flag".to_string()]);

        let result = orch.probe(&config, Some(Duration::from_secs(2))).await;

        assert_eq!(result.outcome, ProbeOutcome::SpawnFailed);
        let step = result.steps.last().unwrap();
        assert_eq!(step.name, STEP_SPAWN);
        let details = step.details.as_deref().unwrap();
        assert!(details.contains("NotFound"));
        assert!(details.contains("mcpreg-no-such-binary"));
        assert!(details.contains("--flag"));
        assert!(orch.handles().is_empty());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_early_exit_is_reported_with_stderr() {
        let orch = orchestrator(delay(2_000));
        let config = sh("crashy", "echo 'missing API key' >&2; exit 3");

        let result = orch.probe(&config, Some(Duration::from_secs(5))).await;

        assert_eq!(result.outcome, ProbeOutcome::Exited);
        let details = result.steps.last().unwrap().details.as_deref().unwrap();
        assert!(details.contains("missing API key"));
        assert!(orch.handles().is_empty());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_protocol_exit_is_not_success() {
        let orch = orchestrator(HandshakeStrategy::Protocol);
        let config = ServerConfig::new_stdio("quitter", "true", vec![]);

        let result = orch.probe(&config, Some(Duration::from_secs(5))).await;

        assert_eq!(result.outcome, ProbeOutcome::Exited);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_protocol_handshake_reports_server() {
        let orch = orchestrator(HandshakeStrategy::Protocol);
        let config = sh(
            "fake",
            r#"read line; echo starting up; printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","serverInfo":{"name":"fake-server","version":"1.2.3"},"capabilities":{}}}'; read line; sleep 30"#,
        );

        let result = orch.probe(&config, Some(Duration::from_secs(5))).await;

        assert!(result.success, "{result:?}");
        let server = result.server.unwrap();
        assert_eq!(server.name, "fake-server");
        assert_eq!(server.version.as_deref(), Some("1.2.3"));
        assert!(orch.handles().is_empty());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_protocol_error_response_is_handshake_failure() {
        let orch = orchestrator(HandshakeStrategy::Protocol);
        let config = sh(
            "grumpy",
            r#"read line; printf '%s\n' '{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"unsupported protocol"}}'; sleep 30"#,
        );

        let result = orch.probe(&config, Some(Duration::from_secs(5))).await;

        assert_eq!(result.outcome, ProbeOutcome::HandshakeFailed);
        assert!(result.error.unwrap().contains("unsupported protocol"));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_env_and_working_directory_reach_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().canonicalize().unwrap();
        let script = format!(
            "[ \"$MCPREG_MARK\" = on ] && [ \"$(pwd -P)\" = '{}' ] && sleep 30",
            expected.display()
        );
        let config = sh("envy", &script)
            .with_env("MCPREG_MARK", "on")
            .with_working_directory(dir.path().to_string_lossy());

        let result = orchestrator(delay(300))
            .probe(&config, Some(Duration::from_secs(5)))
            .await;

        assert_eq!(result.outcome, ProbeOutcome::Succeeded, "{result:?}");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_duplicate_probe_is_rejected_while_first_runs() {
        let orch = std::sync::Arc::new(orchestrator(delay(500)));
        let config = ServerConfig::new_stdio("dup", "sleep", vec!["30".to_string()]);

        let first = {
            let orch = orch.clone();
            let config = config.clone();
            tokio::spawn(async move { orch.probe(&config, Some(Duration::from_secs(5))).await })
        };
        while orch.handles().get("dup").is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let second = orch.probe(&config, Some(Duration::from_secs(5))).await;
        assert_eq!(second.outcome, ProbeOutcome::AlreadyInFlight);
        assert_eq!(second.steps.last().unwrap().status, StepStatus::Pending);

        let first = first.await.unwrap();
        assert_eq!(first.outcome, ProbeOutcome::Succeeded);
        assert!(orch.handles().is_empty());
    }

    /// A wrapper shell that forks the real server and records its pid.
    #[cfg(unix)]
    fn wrapped(name: &str, pid_file: &std::path::Path) -> ServerConfig {
        sh(name, &format!("sleep 30 & echo $! > '{}'; wait", pid_file.display()))
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_wrapped_server_is_stopped_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("server.pid");

        let result = orchestrator(delay(200))
            .probe(&wrapped("wrapper", &pid_file), Some(Duration::from_secs(5)))
            .await;

        assert_eq!(result.outcome, ProbeOutcome::Succeeded);
        let server = pid_from(&std::fs::read_to_string(&pid_file).unwrap());
        assert!(wait_until_gone(server).await, "server {server} outlived the wrapper");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_wrapped_server_is_stopped_after_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("server.pid");

        let result = orchestrator(delay(2_000))
            .probe(&wrapped("wrapper", &pid_file), Some(Duration::from_millis(300)))
            .await;

        assert_eq!(result.outcome, ProbeOutcome::TimedOut);
        let server = pid_from(&std::fs::read_to_string(&pid_file).unwrap());
        assert!(wait_until_gone(server).await, "server {server} outlived the wrapper");
    }

    #[tokio::test]
    async fn test_silent_endpoint_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });
        let orch = orchestrator(delay(100));
        let config = ServerConfig::new_sse("quiet", format!("http://{addr}/sse"));

        let result = orch.probe(&config, Some(Duration::from_millis(200))).await;

        assert_eq!(result.outcome, ProbeOutcome::TimedOut);
        assert_eq!(result.error.as_deref(), Some("Server did not respond within 200ms"));
        assert_eq!(step_names(&result), vec![STEP_VALIDATE, STEP_CONNECT]);
        assert_eq!(result.steps.last().unwrap().status, StepStatus::Error);
        assert!(orch.handles().is_empty());
    }

    #[test]
    fn test_spawn_failure_details_lists_context() {
        let err = io::Error::from_raw_os_error(2);
        let details = spawn_failure_details(&err, "npx", &["-y".to_string()], Some("/srv"));
        assert!(details.contains("os error: 2"));
        assert!(details.contains("command: npx"));
        assert!(details.contains("args: -y"));
        assert!(details.contains("working directory: /srv"));
    }
}
