//! Uniform JSON envelope for `--json` output.

use serde::Serialize;

/// `{success, data?, error?}`, printed once per command.
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl<'a, T: Serialize> Envelope<'a, T> {
    pub const fn ok(data: &'a T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failure that still carries its data (e.g. a failed probe result).
    pub const fn failed(data: &'a T, error: &'a str) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error),
        }
    }
}

impl<'a> Envelope<'a, ()> {
    pub const fn error(error: &'a str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl<T: Serialize> Envelope<'_, T> {
    pub fn render(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn parsed<T: Serialize>(envelope: &Envelope<'_, T>) -> Value {
        serde_json::from_str(&envelope.render().unwrap()).unwrap()
    }

    #[test]
    fn test_ok_omits_error() {
        let data = vec!["fs", "git"];
        assert_eq!(
            parsed(&Envelope::ok(&data)),
            json!({"success": true, "data": ["fs", "git"]})
        );
    }

    #[test]
    fn test_error_omits_data() {
        assert_eq!(
            parsed(&Envelope::error("MCP server not found: fs")),
            json!({"success": false, "error": "MCP server not found: fs"})
        );
    }

    #[test]
    fn test_failed_keeps_both() {
        let data = json!({"outcome": "timed_out"});
        let value = parsed(&Envelope::failed(&data, "Server did not respond within 100ms"));
        assert_eq!(value["success"], false);
        assert_eq!(value["data"]["outcome"], "timed_out");
        assert_eq!(value["error"], "Server did not respond within 100ms");
    }
}
