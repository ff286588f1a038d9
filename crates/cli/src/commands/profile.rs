//! Profile management commands
//!
//! Profiles are named connection settings: endpoint, project and where the
//! bearer token comes from.

use clap::Subcommand;
use gsz_core::{Profile, ProfileManager};
use serde::Serialize;

use super::{Context, fail};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Add or update a profile
    Set(SetArgs),

    /// List all configured profiles
    List(ListArgs),

    /// Remove a profile
    Remove(RemoveArgs),
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Profile name (e.g., "default", "work", "emulator")
    pub name: String,

    /// API endpoint (e.g., `https://storage.googleapis.com`, `http://localhost:4443`)
    #[arg(long, default_value = gsz_core::profile::DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Project that owns listed and created buckets
    #[arg(long)]
    pub project: Option<String>,

    /// Environment variable holding the bearer token
    #[arg(long, conflicts_with = "token")]
    pub token_env: Option<String>,

    /// Literal bearer token (stored in plain text)
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show full details including token source
    #[arg(short, long)]
    pub long: bool,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the profile to remove
    pub name: String,
}

#[derive(Serialize)]
struct ProfileListOutput {
    profiles: Vec<ProfileInfo>,
}

/// Profile information for JSON output (without the token itself)
#[derive(Serialize)]
struct ProfileInfo {
    name: String,
    endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    token_source: String,
}

impl From<&Profile> for ProfileInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            endpoint: profile.endpoint.clone(),
            project_id: profile.project_id.clone(),
            token_source: token_source(profile),
        }
    }
}

fn token_source(profile: &Profile) -> String {
    match profile.token {
        Some(_) => "stored".to_string(),
        None => format!("env:{}", profile.token_env()),
    }
}

#[derive(Serialize)]
struct ProfileOperationOutput {
    success: bool,
    profile: String,
    message: String,
}

/// Execute a profile subcommand
pub async fn execute(cmd: ProfileCommands, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();
    let manager = match ProfileManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            formatter.error(&format!("Failed to load profiles: {e}"));
            return ExitCode::GeneralError;
        }
    };

    match cmd {
        ProfileCommands::Set(args) => execute_set(args, &manager, &formatter),
        ProfileCommands::List(args) => execute_list(args, &manager, &formatter),
        ProfileCommands::Remove(args) => execute_remove(args, &manager, &formatter),
    }
}

fn execute_set(args: SetArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    let mut profile = Profile::new(&args.name);
    profile.endpoint = args.endpoint;
    profile.project_id = args.project;
    profile.token_env = args.token_env;
    profile.token = args.token;

    match manager.set(profile) {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&ProfileOperationOutput {
                    success: true,
                    profile: args.name.clone(),
                    message: format!("Profile '{}' configured successfully", args.name),
                });
            } else {
                let styled_name = formatter.style_name(&args.name);
                formatter.success(&format!("Profile '{styled_name}' configured successfully."));
            }
            ExitCode::Success
        }
        Err(e) => fail(formatter, &e),
    }
}

fn execute_list(args: ListArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    let profiles = match manager.list() {
        Ok(profiles) => profiles,
        Err(e) => return fail(formatter, &e),
    };

    if formatter.is_json() {
        formatter.json(&ProfileListOutput {
            profiles: profiles.iter().map(ProfileInfo::from).collect(),
        });
    } else if profiles.is_empty() {
        formatter.println("No profiles configured.");
    } else {
        for profile in &profiles {
            let styled_name = formatter.style_name(&format!("{:<12}", profile.name));
            let styled_url = formatter.style_url(&profile.endpoint);
            if args.long {
                let project = profile.project_id.as_deref().unwrap_or("-");
                let styled_details = formatter.style_date(&format!(
                    "(project: {project}, token: {})",
                    token_source(profile)
                ));
                formatter.println(&format!("{styled_name} {styled_url} {styled_details}"));
            } else {
                formatter.println(&format!("{styled_name} {styled_url}"));
            }
        }
    }
    ExitCode::Success
}

fn execute_remove(args: RemoveArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    match manager.remove(&args.name) {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&ProfileOperationOutput {
                    success: true,
                    profile: args.name.clone(),
                    message: format!("Profile '{}' removed successfully", args.name),
                });
            } else {
                let styled_name = formatter.style_name(&args.name);
                formatter.success(&format!("Profile '{styled_name}' removed successfully."));
            }
            ExitCode::Success
        }
        Err(gsz_core::Error::ProfileNotFound(_)) => {
            formatter.error(&format!("Profile '{}' not found", args.name));
            ExitCode::NotFound
        }
        Err(e) => fail(formatter, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_info_hides_token() {
        let mut profile = Profile::new("work");
        profile.token = Some("very-secret".into());

        let json = serde_json::to_string(&ProfileInfo::from(&profile)).unwrap();
        assert!(!json.contains("very-secret"));
        assert!(json.contains("\"token_source\":\"stored\""));
    }

    #[test]
    fn test_token_source_names_env_var() {
        let mut profile = Profile::new("work");
        profile.token_env = Some("WORK_TOKEN".into());
        assert_eq!(token_source(&profile), "env:WORK_TOKEN");
    }
}
