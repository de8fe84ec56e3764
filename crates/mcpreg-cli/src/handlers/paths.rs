//! Paths command handler.
//!
//! Shows which registry file is in use and why.

use anyhow::Result;
use serde_json::json;

use mcpreg_core::RegistryPathSource;
use mcpreg_core::paths::{DATA_DIR_ENV, REGISTRY_ENV};

use crate::bootstrap::CliContext;

fn describe(source: RegistryPathSource) -> String {
    match source {
        RegistryPathSource::Explicit => "--registry flag".to_string(),
        RegistryPathSource::RegistryEnv => format!("${REGISTRY_ENV}"),
        RegistryPathSource::DataDirEnv => format!("${DATA_DIR_ENV}"),
        RegistryPathSource::SystemDefault => "system default".to_string(),
    }
}

/// Execute the paths command.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let registry = &ctx.registry;
    let data = json!({
        "registry": registry.path.display().to_string(),
        "source": registry.source,
        "exists": registry.path.exists(),
    });

    ctx.output.success(&data, || {
        println!("registry = {}", registry.path.display());
        println!("source   = {}", describe(registry.source));
        println!("exists   = {}", registry.path.exists());
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_names_env_vars() {
        assert_eq!(describe(RegistryPathSource::RegistryEnv), "$MCPREG_REGISTRY");
        assert_eq!(describe(RegistryPathSource::DataDirEnv), "$MCPREG_DATA_DIR");
    }
}
