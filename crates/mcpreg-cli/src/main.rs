//! CLI entry point.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use mcpreg_cli::{Cli, CliError, OutputMode, run};

/// `RUST_LOG` wins unless `--verbose` asks for debug output.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        // No command provided - show help
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    let output = OutputMode::from_json_flag(cli.json);
    match run(cli.registry, output, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let reported = err
                .downcast_ref::<CliError>()
                .is_some_and(CliError::is_reported);
            if !reported {
                output.error(&format!("{err:#}"));
            }
            ExitCode::FAILURE
        }
    }
}
