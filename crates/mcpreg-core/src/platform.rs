//! OS-specific command translation.
//!
//! On Windows, `npx` is a `.cmd` shim that cannot be executed directly
//! without the shell, so it is routed through `cmd /c`.

use serde::{Deserialize, Serialize};

/// Operating-system family that decides how commands are launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Windows,
    Unix,
}

impl PlatformFamily {
    /// The family of the running OS.
    pub const fn current() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Unix }
    }

    /// Translate a command line for this family. See [`translate`].
    pub fn translate(self, command: &str, args: &[String]) -> (String, Vec<String>) {
        translate(self, command, args)
    }
}

impl Default for PlatformFamily {
    fn default() -> Self {
        Self::current()
    }
}

/// Translate `command` + `args` for execution on `family`.
///
/// Pure and idempotent: translating an already translated command is a no-op.
pub fn translate(family: PlatformFamily, command: &str, args: &[String]) -> (String, Vec<String>) {
    match family {
        PlatformFamily::Windows if command == "npx" => {
            let mut translated = Vec::with_capacity(args.len() + 2);
            translated.push("/c".to_string());
            translated.push("npx".to_string());
            translated.extend(args.iter().cloned());
            ("cmd".to_string(), translated)
        }
        _ => (command.to_string(), args.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_windows_wraps_npx_in_cmd() {
        let (command, args) = translate(PlatformFamily::Windows, "npx", &strings(&["-y", "@mcp/seq"]));
        assert_eq!(command, "cmd");
        assert_eq!(args, strings(&["/c", "npx", "-y", "@mcp/seq"]));
    }

    #[test]
    fn test_windows_leaves_other_commands_alone() {
        let (command, args) = translate(PlatformFamily::Windows, "node", &strings(&["server.js"]));
        assert_eq!(command, "node");
        assert_eq!(args, strings(&["server.js"]));
    }

    #[test]
    fn test_unix_is_identity() {
        let (command, args) = translate(PlatformFamily::Unix, "npx", &strings(&["-y", "pkg"]));
        assert_eq!(command, "npx");
        assert_eq!(args, strings(&["-y", "pkg"]));
    }

    #[test]
    fn test_translation_is_idempotent() {
        let (command, args) = PlatformFamily::Windows.translate("npx", &strings(&["-y", "pkg"]));
        let again = PlatformFamily::Windows.translate(&command, &args);
        assert_eq!(again, (command, args));
    }
}
