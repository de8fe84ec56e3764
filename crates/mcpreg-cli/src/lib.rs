//! `mcpreg` command-line interface.
//!
//! The binary in `main.rs` only initialises logging and maps the result of
//! [`run`] to an exit code; everything else lives here so it can be tested.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary target only
use tokio as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, HandshakeMode, ProbeArgs, ServerArgs};
pub use error::CliError;
pub use parser::Cli;
pub use presentation::OutputMode;

/// Compose the context for `command` and dispatch it.
pub async fn run(registry: Option<String>, output: OutputMode, command: Commands) -> anyhow::Result<()> {
    let config = CliConfig {
        registry,
        settings: command.probe_settings(),
        output,
    };
    let ctx = bootstrap(config)?;

    match command {
        Commands::List => handlers::list::execute(&ctx).await,
        Commands::Get { name } => handlers::get::execute(&ctx, &name).await,
        Commands::Add(args) => handlers::add::execute(&ctx, args).await,
        Commands::Remove { name } => handlers::remove::execute(&ctx, &name).await,
        Commands::Validate(args) => handlers::validate::execute(&ctx, args),
        Commands::Probe { name, probe } => {
            handlers::probe::execute(&ctx, &name, probe.timeout()).await
        }
        Commands::TestAll { probe, .. } => handlers::test_all::execute(&ctx, probe.timeout()).await,
        Commands::Paths => handlers::paths::execute(&ctx),
    }
}
