//! Remove command handler.

use anyhow::Result;
use serde_json::json;

use crate::bootstrap::CliContext;

/// Execute the remove command.
pub async fn execute(ctx: &CliContext, name: &str) -> Result<()> {
    ctx.service().remove(name).await?;
    ctx.output
        .success(&json!({ "removed": name }), || println!("Removed '{name}'"))
}
