//! Tool-server definition types.
//!
//! These types are the persisted and runtime shapes of an MCP server entry.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the host reaches an MCP server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Spawned child process spoken to over stdin/stdout
    #[default]
    Stdio,
    /// Streamable HTTP endpoint
    Http,
    /// Server-sent events endpoint
    Sse,
}

impl TransportKind {
    /// All transports, in display order.
    pub const ALL: [Self; 3] = [Self::Stdio, Self::Http, Self::Sse];

    /// Canonical lowercase name, as stored on disk.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Sse => "sse",
        }
    }

    /// Whether this transport is served over the network.
    #[must_use]
    pub const fn is_remote(self) -> bool {
        matches!(self, Self::Http | Self::Sse)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a transport name is not one of the known kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport '{0}' (expected stdio, http or sse)")]
pub struct UnknownTransport(pub String);

impl FromStr for TransportKind {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            "sse" => Ok(Self::Sse),
            other => Err(UnknownTransport(other.to_string())),
        }
    }
}

/// A stored server entry, keyed by name in the registry document.
///
/// Stdio fields (`command`, `args`, `env`, `working_directory`) and remote
/// fields (`url`, `headers`) share one flat shape so the file stays readable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDefinition {
    pub transport: TransportKind,

    // --- Stdio server fields ---
    /// Executable to launch (e.g. "npx" or "/usr/local/bin/my-server").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Overlaid on top of the ambient environment when spawning.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    // --- Remote server fields ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl ServerDefinition {
    /// Create a stdio definition.
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            transport: TransportKind::Stdio,
            command: Some(command.into()),
            args,
            ..Self::default()
        }
    }

    /// Create a remote (http or sse) definition.
    pub fn remote(transport: TransportKind, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

/// A named server definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    #[serde(flatten)]
    pub definition: ServerDefinition,
}

impl ServerConfig {
    /// Create a stdio server config.
    pub fn new_stdio(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            definition: ServerDefinition::stdio(command, args),
        }
    }

    /// Create an http server config.
    pub fn new_http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: ServerDefinition::remote(TransportKind::Http, url),
        }
    }

    /// Create an sse server config.
    pub fn new_sse(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: ServerDefinition::remote(TransportKind::Sse, url),
        }
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.definition.env.insert(key.into(), value.into());
        self
    }

    /// Add an HTTP header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.definition.headers.insert(key.into(), value.into());
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
        self.definition.working_directory = Some(dir.into());
        self
    }

    pub const fn transport(&self) -> TransportKind {
        self.definition.transport
    }
}

/// Loose, user-supplied server input.
///
/// Unlike [`ServerConfig`] the transport is an arbitrary string, so a form or
/// CLI can hand over whatever the user typed and get every problem reported
/// at once by the validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDraft {
    pub name: String,
    pub transport: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ServerDraft {
    /// Start a draft with a name and transport.
    pub fn new(name: impl Into<String>, transport: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: transport.into(),
            ..Self::default()
        }
    }

    /// Set the command.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set the arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the url.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl From<ServerConfig> for ServerDraft {
    fn from(config: ServerConfig) -> Self {
        let ServerConfig { name, definition } = config;
        Self {
            name,
            transport: definition.transport.as_str().to_string(),
            command: definition.command,
            args: definition.args,
            env: definition.env,
            working_directory: definition.working_directory,
            url: definition.url,
            headers: definition.headers,
        }
    }
}

/// Last-known connectivity of a server.
///
/// Held in memory only; it reflects the most recent probe in this process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// Never probed
    #[default]
    Unknown,
    /// Just added, a probe is expected
    Testing,
    /// Last probe succeeded
    Connected,
    /// Last probe failed
    Failed,
}

/// A server as returned to callers: definition plus runtime status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    pub name: String,
    pub config: ServerDefinition,
    pub status: ServerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_probed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ServerRecord {
    /// Create a record with no probe history.
    pub fn new(name: impl Into<String>, config: ServerDefinition, status: ServerStatus) -> Self {
        Self {
            name: name.into(),
            config,
            status,
            last_probed_at: None,
            last_error: None,
        }
    }

    /// The typed config for this record.
    pub fn to_config(&self) -> ServerConfig {
        ServerConfig {
            name: self.name.clone(),
            definition: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_round_trips_through_str() {
        for kind in TransportKind::ALL {
            assert_eq!(kind.as_str().parse::<TransportKind>().unwrap(), kind);
        }
        assert!("websocket".parse::<TransportKind>().is_err());
    }

    #[test]
    fn test_definition_uses_camel_case_and_skips_empty_fields() {
        let config = ServerConfig::new_stdio("fs", "npx", vec!["-y".to_string()])
            .with_working_directory("/tmp");
        let json = serde_json::to_string(&config.definition).unwrap();

        assert!(json.contains("\"transport\":\"stdio\""));
        assert!(json.contains("\"workingDirectory\":\"/tmp\""));
        assert!(!json.contains("url"));
        assert!(!json.contains("headers"));
        assert!(!json.contains("env"));
    }

    #[test]
    fn test_config_flattens_definition() {
        let config = ServerConfig::new_http("remote", "http://localhost:3001/mcp")
            .with_header("Authorization", "Bearer abc");
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["name"], "remote");
        assert_eq!(value["transport"], "http");
        assert_eq!(value["headers"]["Authorization"], "Bearer abc");
    }

    #[test]
    fn test_draft_from_config_keeps_fields() {
        let config = ServerConfig::new_stdio("git", "uvx", vec!["mcp-server-git".to_string()])
            .with_env("GIT_DIR", "/repo/.git");
        let draft = ServerDraft::from(config);

        assert_eq!(draft.transport, "stdio");
        assert_eq!(draft.command.as_deref(), Some("uvx"));
        assert_eq!(draft.env.get("GIT_DIR").map(String::as_str), Some("/repo/.git"));
    }

    #[test]
    fn test_record_status_serializes_lowercase() {
        let record = ServerRecord::new(
            "seq",
            ServerDefinition::stdio("npx", vec![]),
            ServerStatus::Testing,
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"status\":\"testing\""));
        assert!(!json.contains("lastProbedAt"));
    }
}
