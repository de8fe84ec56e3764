//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Manage and probe MCP tool servers.
///
/// Global options apply to every subcommand.
#[derive(Parser)]
#[command(name = "mcpreg")]
#[command(about = "Register MCP servers and check that they actually start")]
#[command(version)]
pub struct Cli {
    /// Registry file to use (defaults to $MCPREG_REGISTRY, then the config dir)
    #[arg(long = "registry", global = true)]
    pub registry: Option<String>,

    /// Print machine-readable JSON ({success, data, error})
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["mcpreg", "list", "--json", "-v", "--registry", "/tmp/r.json"]);
        assert!(cli.json);
        assert!(cli.verbose);
        assert_eq!(cli.registry.as_deref(), Some("/tmp/r.json"));
        assert!(matches!(cli.command, Some(Commands::List)));
    }
}
