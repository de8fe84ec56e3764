//! Probe command handler.

use std::time::Duration;

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::print_probe_result;

/// Execute the probe command.
///
/// A failed probe is printed like a successful one and then reported as
/// an error so the exit code reflects it.
pub async fn execute(ctx: &CliContext, name: &str, timeout: Option<Duration>) -> Result<()> {
    let result = ctx.service().probe(name, timeout).await?;

    if result.success {
        return ctx.output.success(&result, || print_probe_result(name, &result));
    }

    let error = result.error.clone().unwrap_or_else(|| "Probe failed".to_string());
    ctx.output
        .failure(&result, &error, || print_probe_result(name, &result))?;
    Err(CliError::Failed(error).into())
}
