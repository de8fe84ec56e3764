//! Field-level validation of server definitions.
//!
//! Validation collects every violated rule instead of stopping at the first
//! one, so a form can highlight all problems at once. It never fails: the
//! outcome is always a [`ValidationReport`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{ServerConfig, ServerDefinition, ServerDraft, TransportKind};

/// Allowed server names: lowercase letters, digits and hyphens.
pub const NAME_PATTERN: &str = "^[a-z0-9-]+$";

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NAME_PATTERN).expect("NAME_PATTERN is a valid regex"));

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Outcome of validating a server definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Whether any error concerns `field`.
    pub fn has_error_on(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// All messages joined for single-line display.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.valid {
            f.write_str("valid")
        } else {
            f.write_str(&self.summary())
        }
    }
}

/// Whether `name` is an acceptable server name.
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn collect_errors(
    name: &str,
    transport: Result<TransportKind, String>,
    command: Option<&str>,
    url: Option<&str>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if !is_valid_name(name) {
        errors.push(FieldError::new(
            "name",
            "Name must contain only lowercase letters, digits and hyphens",
        ));
    }

    match transport {
        Ok(TransportKind::Stdio) => {
            if is_blank(command) {
                errors.push(FieldError::new("command", "Command is required for stdio servers"));
            }
        }
        Ok(kind @ (TransportKind::Http | TransportKind::Sse)) => {
            if is_blank(url) {
                errors.push(FieldError::new("url", format!("URL is required for {kind} servers")));
            }
        }
        Err(raw) => {
            errors.push(FieldError::new(
                "transport",
                format!("Transport must be one of stdio, http or sse (got '{raw}')"),
            ));
        }
    }

    errors
}

/// Validate loose user input.
pub fn validate(draft: &ServerDraft) -> ValidationReport {
    let transport = draft
        .transport
        .parse::<TransportKind>()
        .map_err(|e| e.0);
    ValidationReport::from_errors(collect_errors(
        &draft.name,
        transport,
        draft.command.as_deref(),
        draft.url.as_deref(),
    ))
}

/// Validate an already typed config.
pub fn validate_config(config: &ServerConfig) -> ValidationReport {
    let ServerDefinition {
        transport,
        command,
        url,
        ..
    } = &config.definition;
    ValidationReport::from_errors(collect_errors(
        &config.name,
        Ok(*transport),
        command.as_deref(),
        url.as_deref(),
    ))
}

impl ServerDraft {
    /// Validate and convert into a typed config.
    ///
    /// Fields that do not belong to the chosen transport are dropped.
    pub fn into_config(self) -> Result<ServerConfig, ValidationReport> {
        let report = validate(&self);
        if !report.valid {
            return Err(report);
        }

        // The report is valid, so the transport parses.
        let transport = self
            .transport
            .parse::<TransportKind>()
            .map_err(|_| report.clone())?;

        let definition = match transport {
            TransportKind::Stdio => ServerDefinition {
                transport,
                command: self.command,
                args: self.args,
                env: self.env,
                working_directory: self.working_directory.filter(|d| !d.trim().is_empty()),
                ..ServerDefinition::default()
            },
            TransportKind::Http | TransportKind::Sse => ServerDefinition {
                transport,
                url: self.url,
                headers: self.headers,
                ..ServerDefinition::default()
            },
        };

        Ok(ServerConfig {
            name: self.name,
            definition,
        })
    }
}

impl ServerConfig {
    /// Re-run validation on a typed config.
    pub fn check(&self) -> ValidationReport {
        validate_config(self)
    }
}
