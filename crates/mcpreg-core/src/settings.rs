//! Probe settings and validation.
//!
//! Pure configuration types with no infrastructure dependencies.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller timeout used when none is given.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;

/// Delay used by the fixed-delay handshake.
pub const DEFAULT_HANDSHAKE_DELAY_MS: u64 = 500;

/// Number of probes a batch run keeps in flight (1 = one after another).
pub const DEFAULT_BATCH_CONCURRENCY: usize = 1;

/// Grace period between SIGTERM and SIGKILL when stopping a probed process.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2_000;

/// How a probe decides that a spawned stdio server is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HandshakeStrategy {
    /// Assume readiness once the process survived for `delay_ms`.
    FixedDelay { delay_ms: u64 },
    /// Exchange `initialize` over stdio and wait for the server's response.
    Protocol,
}

impl HandshakeStrategy {
    pub const fn fixed_delay(delay: Duration) -> Self {
        Self::FixedDelay {
            delay_ms: delay.as_millis() as u64,
        }
    }
}

impl Default for HandshakeStrategy {
    fn default() -> Self {
        Self::FixedDelay {
            delay_ms: DEFAULT_HANDSHAKE_DELAY_MS,
        }
    }
}

/// Settings for the probing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Timeout applied when a caller does not pass one.
    pub default_timeout_ms: u64,

    /// Readiness check for stdio servers.
    pub handshake: HandshakeStrategy,

    /// Maximum probes in flight during `test_all` (1 = sequential).
    pub batch_concurrency: usize,

    /// SIGTERM → SIGKILL grace period when stopping a probed process.
    pub shutdown_grace_ms: u64,

    /// Number of stderr lines kept for failure diagnostics.
    pub stderr_tail_lines: usize,
}

impl ProbeSettings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            default_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            handshake: HandshakeStrategy::FixedDelay {
                delay_ms: DEFAULT_HANDSHAKE_DELAY_MS,
            },
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
            stderr_tail_lines: 20,
        }
    }

    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Set the handshake strategy.
    #[must_use]
    pub const fn with_handshake(mut self, handshake: HandshakeStrategy) -> Self {
        self.handshake = handshake;
        self
    }

    /// Set the batch concurrency.
    #[must_use]
    pub const fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency;
        self
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Errors for invalid probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Probe timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Batch concurrency must be between 1 and 64, got {0}")]
    InvalidConcurrency(usize),

    #[error("Handshake delay must be greater than zero")]
    ZeroHandshakeDelay,
}

/// Validate probe settings.
pub const fn validate_settings(settings: &ProbeSettings) -> Result<(), SettingsError> {
    if settings.default_timeout_ms == 0 {
        return Err(SettingsError::ZeroTimeout);
    }
    if settings.batch_concurrency == 0 || settings.batch_concurrency > 64 {
        return Err(SettingsError::InvalidConcurrency(settings.batch_concurrency));
    }
    if let HandshakeStrategy::FixedDelay { delay_ms: 0 } = settings.handshake {
        return Err(SettingsError::ZeroHandshakeDelay);
    }
    Ok(())
}
