//! Command definitions and shared command plumbing

pub mod bucket;
pub mod completions;
pub mod get;
pub mod ls;
pub mod mb;
pub mod profile;
pub mod put;
pub mod rb;
pub mod rm;
pub mod zip;

use clap::Subcommand;
use gsz_core::{Config, Error, Profile, ProfileManager, RemotePath, Result};
use gsz_gcs::GcsClient;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Profile used when none is named and none is configured
pub const DEFAULT_PROFILE: &str = "default";

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage connection profiles
    #[command(subcommand)]
    Profile(profile::ProfileCommands),

    /// List buckets, or objects under a path
    Ls(ls::LsArgs),

    /// Download an object
    Get(get::GetArgs),

    /// Upload a local file
    Put(put::PutArgs),

    /// Remove objects
    Rm(rm::RmArgs),

    /// Make a bucket
    Mb(mb::MbArgs),

    /// Remove a bucket
    Rb(rb::RbArgs),

    /// Pack every object under a prefix into one zip archive
    Zip(zip::ZipArgs),

    /// Bucket configuration: info, public access, CORS, website
    Bucket(bucket::BucketArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Settings shared by every command
#[derive(Debug)]
pub struct Context {
    pub output: OutputConfig,
    pub profile: Option<String>,
    pub config: Config,
}

impl Context {
    pub fn new(output: OutputConfig, profile: Option<String>, config: Config) -> Self {
        Self {
            output,
            profile,
            config,
        }
    }

    pub fn formatter(&self) -> Formatter {
        Formatter::new(self.output.clone())
    }

    /// Resolve the active profile: `--profile`, then `[defaults] profile`,
    /// then a saved `default` profile, then built-in settings
    pub fn profile(&self) -> Result<Profile> {
        let manager = ProfileManager::new()?;
        match self.profile.as_ref().or(self.config.defaults.profile.as_ref()) {
            Some(name) => manager.get(name),
            None => match manager.get(DEFAULT_PROFILE) {
                Err(Error::ProfileNotFound(_)) => Ok(Profile::new(DEFAULT_PROFILE)),
                other => other,
            },
        }
    }

    /// Client for the active profile with the configured retry settings
    pub fn client(&self) -> Result<GcsClient> {
        let profile = self.profile()?;
        tracing::debug!(profile = %profile.name, endpoint = %profile.endpoint, "Using profile");
        Ok(GcsClient::new(&profile)?.with_retry(&self.config.retry))
    }
}

/// Execute a parsed command
pub async fn execute(command: Commands, ctx: &Context, cli: clap::Command) -> ExitCode {
    match command {
        Commands::Profile(cmd) => profile::execute(cmd, ctx).await,
        Commands::Ls(args) => ls::execute(args, ctx).await,
        Commands::Get(args) => get::execute(args, ctx).await,
        Commands::Put(args) => put::execute(args, ctx).await,
        Commands::Rm(args) => rm::execute(args, ctx).await,
        Commands::Mb(args) => mb::execute(args, ctx).await,
        Commands::Rb(args) => rb::execute(args, ctx).await,
        Commands::Zip(args) => zip::execute(args, ctx).await,
        Commands::Bucket(args) => bucket::execute(args, ctx).await,
        Commands::Completions(args) => completions::execute(args, cli),
    }
}

/// Report an error and map it to an exit code
pub fn fail(formatter: &Formatter, error: &Error) -> ExitCode {
    formatter.error(&error.to_string());
    ExitCode::from_error(error)
}

/// Parse a remote argument, reporting a usage error on failure
pub fn remote_arg(formatter: &Formatter, input: &str) -> std::result::Result<RemotePath, ExitCode> {
    RemotePath::parse(input).map_err(|e| {
        formatter.error(&e.to_string());
        ExitCode::UsageError
    })
}

/// Build a client, reporting failures
pub fn client_or_exit(ctx: &Context, formatter: &Formatter) -> std::result::Result<GcsClient, ExitCode> {
    ctx.client().map_err(|e| fail(formatter, &e))
}
