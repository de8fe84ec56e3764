//! Add command handler.
//!
//! Validates the definition, stores it, and reports the stored form (which
//! may differ from the input after platform translation).

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::commands::ServerArgs;
use crate::presentation::server_target;

/// Execute the add command.
pub async fn execute(ctx: &CliContext, args: ServerArgs) -> Result<()> {
    let record = ctx.service().add(args.into_draft()).await?;

    ctx.output.success(&record, || {
        println!(
            "Added '{}' ({}): {}",
            record.name,
            record.config.transport,
            server_target(&record.config)
        );
        println!("Run 'mcpreg probe {}' to check it.", record.name);
    })
}
