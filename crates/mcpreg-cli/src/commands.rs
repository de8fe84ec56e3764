//! Commands enum and the argument groups shared between subcommands.

use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};

use mcpreg_core::{
    DEFAULT_HANDSHAKE_DELAY_MS, HandshakeStrategy, ProbeSettings, ServerDraft,
};

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List registered servers
    List,

    /// Show one server
    Get {
        /// Server name
        name: String,
    },

    /// Register a new server
    Add(ServerArgs),

    /// Remove a server
    Remove {
        /// Server name
        name: String,
    },

    /// Check a server definition without saving it
    Validate(ServerArgs),

    /// Start (or connect to) a server once and report whether it answers
    Probe {
        /// Server name
        name: String,

        #[command(flatten)]
        probe: ProbeArgs,
    },

    /// Probe every registered server
    TestAll {
        #[command(flatten)]
        probe: ProbeArgs,

        /// Number of probes to run at once (default 1, one after another)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Show where the registry file lives
    Paths,
}

impl Commands {
    /// Probe settings for this invocation, with any flag overrides applied.
    pub fn probe_settings(&self) -> ProbeSettings {
        let defaults = ProbeSettings::with_defaults();
        match self {
            Self::Probe { probe, .. } => probe.apply(defaults),
            Self::TestAll { probe, concurrency } => {
                let settings = probe.apply(defaults);
                match concurrency {
                    Some(n) => settings.with_batch_concurrency(*n),
                    None => settings,
                }
            }
            _ => defaults,
        }
    }
}

/// Server definition flags shared by `add` and `validate`.
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Unique server name (lowercase letters, digits and dashes)
    pub name: String,

    /// Transport: stdio, http or sse
    #[arg(long, default_value = "stdio")]
    pub transport: String,

    /// Executable to launch (stdio)
    #[arg(long)]
    pub command: Option<String>,

    /// Argument passed to the command; repeat for several
    #[arg(long = "arg", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Environment variable for the process, as KEY=VALUE; repeatable
    #[arg(long = "env", value_parser = parse_key_val)]
    pub env: Vec<(String, String)>,

    /// Working directory for the process (stdio)
    #[arg(long = "cwd")]
    pub working_directory: Option<String>,

    /// Endpoint URL (http, sse)
    #[arg(long)]
    pub url: Option<String>,

    /// HTTP header as KEY=VALUE; repeatable
    #[arg(long = "header", value_parser = parse_key_val)]
    pub headers: Vec<(String, String)>,
}

impl ServerArgs {
    pub fn into_draft(self) -> ServerDraft {
        ServerDraft {
            name: self.name,
            transport: self.transport,
            command: self.command,
            args: self.args,
            env: self.env.into_iter().collect(),
            working_directory: self.working_directory,
            url: self.url,
            headers: self.headers.into_iter().collect(),
        }
    }
}

/// How to decide that a stdio server is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HandshakeMode {
    /// Consider the server ready once it stayed up for a fixed delay (default)
    Delay,
    /// Send `initialize` and wait for the answer
    Protocol,
}

/// Probe tuning flags shared by `probe` and `test-all`.
#[derive(Args, Debug, Clone, Default)]
pub struct ProbeArgs {
    /// Give up on a server after this many milliseconds
    #[arg(long, env = "MCPREG_PROBE_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Readiness check for stdio servers
    #[arg(long, value_enum)]
    pub handshake: Option<HandshakeMode>,

    /// Delay used by `--handshake delay`
    #[arg(long)]
    pub handshake_delay_ms: Option<u64>,
}

impl ProbeArgs {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Apply flag overrides on top of `settings`.
    ///
    /// A delay without an explicit mode implies `--handshake delay`.
    pub fn apply(&self, mut settings: ProbeSettings) -> ProbeSettings {
        if let Some(timeout_ms) = self.timeout_ms {
            settings.default_timeout_ms = timeout_ms;
        }
        let mode = self
            .handshake
            .or_else(|| self.handshake_delay_ms.map(|_| HandshakeMode::Delay));
        match mode {
            Some(HandshakeMode::Protocol) => settings.with_handshake(HandshakeStrategy::Protocol),
            Some(HandshakeMode::Delay) => settings.with_handshake(HandshakeStrategy::FixedDelay {
                delay_ms: self.handshake_delay_ms.unwrap_or(DEFAULT_HANDSHAKE_DELAY_MS),
            }),
            None => settings,
        }
    }
}

/// Parse `KEY=VALUE`. The value may itself contain `=`.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
