//! Lineage CLI - resolve node payloads from exported execution histories
//!
//! Operators use it to:
//! - Resolve node addresses to their recorded input and output payloads
//! - Inspect the node records of a single exported history
//! - Compute the root tag of an address

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

use commands::{inspect, resolve};
use config::LineageConfig;
pub use error::{CliError, CliResult};
use lineage_history::DirectoryHistoryStore;

/// Lineage CLI application
#[derive(Parser)]
#[command(name = "lineage")]
#[command(about = "Lineage - node address resolution across execution histories", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "LINEAGE_CONFIG")]
    config: Option<String>,

    /// Directory of exported histories
    #[arg(long, env = "LINEAGE_HISTORY_DIR")]
    history_dir: Option<PathBuf>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Resolve node addresses to recorded payloads
    Resolve(resolve::ResolveArgs),

    /// List the node records of one history
    Inspect(inspect::InspectArgs),

    /// Print the root tag of an address
    RootName {
        /// Node address
        address: String,
    },

    /// Show configuration
    Config,
}

/// Run using the current process arguments.
pub async fn run() -> CliResult<()> {
    run_with_args(std::env::args_os()).await
}

/// Run using the provided argument iterator.
pub async fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Initialize tracing on stderr so structured output stays clean
    let filter = if cli.verbose { "debug" } else { "warn" };
    // try_init: run_with_args may be called more than once in one process
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .try_init();

    // Load config
    let mut config = LineageConfig::load(cli.config.as_deref())?;
    if cli.history_dir.is_some() {
        config.history_dir = cli.history_dir.clone();
    }

    match cli.command {
        Commands::Resolve(args) => {
            let store = DirectoryHistoryStore::new(config.require_history_dir()?);
            resolve::execute(args, store, &config.resolver, cli.output).await
        }
        Commands::Inspect(args) => {
            let store = DirectoryHistoryStore::new(config.require_history_dir()?);
            inspect::execute(args, &store, cli.output).await
        }
        Commands::RootName { address } => {
            println!("{}", lineage_types::root_name(&address));
            Ok(())
        }
        Commands::Config => output::print_single(&config, cli.output),
    }
}
