//! gsz - object storage client with server-side style zip export
//!
//! Lists, transfers and configures buckets and objects over the storage
//! JSON API, and packs a prefix into a single zip archive.

mod commands;
mod exit_code;
mod output;

use anyhow::Context as _;
use clap::{ArgAction, CommandFactory, Parser};
use gsz_core::{Config, ConfigManager};
use tracing_subscriber::EnvFilter;

use crate::commands::{Commands, Context};
use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "GSZ_LOG";

#[derive(Parser, Debug)]
#[command(name = "gsz", version, about, propagate_version = true)]
pub struct Cli {
    /// Output strict JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Profile to use instead of the configured default
    #[arg(long, global = true, env = "GSZ_PROFILE")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Logs go to stderr so JSON on stdout stays clean
fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(&directive)
            .with_context(|| format!("Invalid {LOG_ENV} filter '{directive}'"))?,
        _ => EnvFilter::new(default_level),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

fn load_config() -> anyhow::Result<Config> {
    let manager = ConfigManager::new()?;
    let config = manager
        .load()
        .with_context(|| format!("Failed to load {}", manager.path().display()))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("{e:#}");
        return ExitCode::UsageError.into();
    }

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::UsageError.into();
        }
    };

    let output = OutputConfig::resolve(&config.defaults, cli.json, cli.no_color, cli.quiet);
    let ctx = Context::new(output, cli.profile, config);

    commands::execute(cli.command, &ctx, Cli::command()).await.into()
}
