//! bucket command - Bucket configuration
//!
//! Metadata, public access, CORS rules and static website settings.

use clap::{Args, Subcommand};
use gsz_core::{Error, RemotePath};
use gsz_gcs::{BucketDetails, BucketResource, CorsRule, GcsClient, NOTHING_TO_UPDATE, Website};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{Context, client_or_exit, fail};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct BucketArgs {
    #[command(subcommand)]
    pub command: BucketCommands,
}

#[derive(Subcommand, Debug)]
pub enum BucketCommands {
    /// Show bucket metadata and its IAM policy
    Info(NameArg),

    /// Grant public read access to a bucket or an object
    Public(TargetArg),

    /// Revoke public read access from a bucket or an object
    Private(TargetArg),

    /// Patch bucket metadata with a JSON object
    Update(UpdateArgs),

    /// Manage CORS rules
    #[command(subcommand)]
    Cors(CorsCommands),

    /// Configure static website serving
    Website(WebsiteArgs),
}

#[derive(Args, Debug)]
pub struct NameArg {
    /// Bucket name
    pub bucket: String,
}

#[derive(Args, Debug)]
pub struct TargetArg {
    /// Bucket, or object inside it (bucket[/key])
    pub path: String,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Bucket name
    pub bucket: String,

    /// Fields to patch, e.g. '{"labels":{"team":"media"}}'
    pub patch: String,
}

#[derive(Subcommand, Debug)]
pub enum CorsCommands {
    /// Replace the bucket's CORS rules with a single rule
    Set(CorsArgs),

    /// Check whether a configured rule already covers the given one
    Exists(CorsArgs),

    /// Remove every CORS rule
    Disable(NameArg),
}

#[derive(Args, Debug)]
pub struct CorsArgs {
    /// Bucket name
    pub bucket: String,

    /// Allowed origin (repeatable)
    #[arg(long = "origin", required = true)]
    pub origins: Vec<String>,

    /// Allowed method (repeatable)
    #[arg(long = "method", default_value = "GET")]
    pub methods: Vec<String>,

    /// Response header exposed to the browser (repeatable)
    #[arg(long = "header")]
    pub headers: Vec<String>,

    /// Preflight cache lifetime in seconds
    #[arg(long)]
    pub max_age: Option<u64>,
}

impl From<&CorsArgs> for CorsRule {
    fn from(args: &CorsArgs) -> Self {
        Self {
            origin: args.origins.clone(),
            method: args.methods.iter().map(|m| m.to_uppercase()).collect(),
            response_header: args.headers.clone(),
            max_age_seconds: args.max_age,
        }
    }
}

#[derive(Args, Debug)]
pub struct WebsiteArgs {
    /// Bucket name
    pub bucket: String,

    /// Object served for directory requests, e.g. index.html
    #[arg(long)]
    pub main_page: Option<String>,

    /// Object served for missing paths, e.g. 404.html
    #[arg(long)]
    pub not_found: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateOutput {
    success: bool,
    bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<BucketResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct CorsExistsOutput {
    bucket: String,
    exists: bool,
}

/// Execute a bucket subcommand
pub async fn execute(args: BucketArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();
    let client = match client_or_exit(ctx, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let result = match args.command {
        BucketCommands::Info(arg) => info(&client, &formatter, bucket_name(&arg.bucket)).await,
        BucketCommands::Public(arg) => public_access(&client, &formatter, &arg.path, true).await,
        BucketCommands::Private(arg) => public_access(&client, &formatter, &arg.path, false).await,
        BucketCommands::Update(args) => update(&client, &formatter, &args).await,
        BucketCommands::Cors(CorsCommands::Set(args)) => {
            let bucket = bucket_name(&args.bucket);
            client
                .setup_cors(bucket, &[CorsRule::from(&args)])
                .await
                .map(|resource| report_resource(&formatter, &resource, "CORS rules updated"))
        }
        BucketCommands::Cors(CorsCommands::Exists(args)) => {
            let bucket = bucket_name(&args.bucket);
            client
                .cors_exists(bucket, &CorsRule::from(&args))
                .await
                .map(|exists| {
                    if formatter.is_json() {
                        formatter.json(&CorsExistsOutput {
                            bucket: bucket.to_string(),
                            exists,
                        });
                    } else if exists {
                        formatter.println("A matching CORS rule is configured.");
                    } else {
                        formatter.println("No matching CORS rule.");
                    }
                })
        }
        BucketCommands::Cors(CorsCommands::Disable(arg)) => client
            .disable_cors(bucket_name(&arg.bucket))
            .await
            .map(|resource| report_resource(&formatter, &resource, "CORS disabled")),
        BucketCommands::Website(args) => {
            let website = Website {
                main_page_suffix: args.main_page,
                not_found_page: args.not_found,
            };
            client
                .setup_website(bucket_name(&args.bucket), &website)
                .await
                .map(|resource| report_resource(&formatter, &resource, "Website configured"))
        }
    };

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => fail(&formatter, &e),
    }
}

fn bucket_name(input: &str) -> &str {
    input.trim_start_matches("gs://").trim_end_matches('/')
}

async fn info(client: &GcsClient, formatter: &Formatter, bucket: &str) -> gsz_core::Result<()> {
    let details = client.get_bucket(bucket).await?;
    if formatter.is_json() {
        formatter.json(&details);
    } else {
        formatter.key_values(&info_pairs(&details));
    }
    Ok(())
}

fn info_pairs(details: &BucketDetails) -> Vec<(&'static str, String)> {
    let bucket = &details.bucket;
    let or_dash = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    let mut pairs = vec![
        ("Name", bucket.name.clone()),
        ("Created", or_dash(&bucket.time_created)),
        ("Location", or_dash(&bucket.location)),
        ("Storage class", or_dash(&bucket.storage_class)),
        ("Public", details.iam.is_public().to_string()),
        ("CORS rules", bucket.cors.len().to_string()),
    ];
    if let Some(website) = &bucket.website {
        pairs.push(("Main page", or_dash(&website.main_page_suffix)));
        pairs.push(("Not found page", or_dash(&website.not_found_page)));
    }
    pairs
}

async fn public_access(
    client: &GcsClient,
    formatter: &Formatter,
    input: &str,
    public: bool,
) -> gsz_core::Result<()> {
    let target = RemotePath::parse(input)?;

    let outcome = if public {
        client.add_public_access(&target).await?
    } else {
        client.remove_public_access(&target).await?
    };

    if formatter.is_json() {
        formatter.json(&outcome);
    } else if let Some(message) = &outcome.message {
        formatter.warning(message);
    } else if public {
        formatter.success(&format!("'{target}' is now public."));
        formatter.println(&formatter.style_url(&outcome.uri));
    } else {
        formatter.success(&format!("'{target}' is now private."));
    }
    Ok(())
}

async fn update(client: &GcsClient, formatter: &Formatter, args: &UpdateArgs) -> gsz_core::Result<()> {
    let bucket = bucket_name(&args.bucket);
    let patch: Map<String, Value> = serde_json::from_str(&args.patch)
        .map_err(|e| Error::Config(format!("Patch must be a JSON object: {e}")))?;

    let resource = client.update_bucket(bucket, patch).await?;
    if formatter.is_json() {
        let message = resource.is_none().then(|| NOTHING_TO_UPDATE.to_string());
        formatter.json(&UpdateOutput {
            success: true,
            bucket: bucket.to_string(),
            resource,
            message,
        });
    } else {
        match resource {
            Some(_) => formatter.success(&format!("Bucket '{bucket}' updated.")),
            None => formatter.warning(NOTHING_TO_UPDATE),
        }
    }
    Ok(())
}

fn report_resource(formatter: &Formatter, resource: &BucketResource, message: &str) {
    if formatter.is_json() {
        formatter.json(resource);
    } else {
        let styled = formatter.style_name(&resource.name);
        formatter.success(&format!("{message} for '{styled}'."));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsz_gcs::IamPolicy;

    #[test]
    fn test_cors_rule_from_args() {
        let args = CorsArgs {
            bucket: "media".into(),
            origins: vec!["https://example.com".into()],
            methods: vec!["get".into(), "put".into()],
            headers: vec![],
            max_age: Some(3600),
        };
        let rule = CorsRule::from(&args);
        assert_eq!(rule.method, vec!["GET", "PUT"]);
        assert_eq!(rule.max_age_seconds, Some(3600));
    }

    #[test]
    fn test_bucket_name_strips_scheme() {
        assert_eq!(bucket_name("gs://media/"), "media");
        assert_eq!(bucket_name("media"), "media");
    }

    #[test]
    fn test_info_pairs() {
        let details = BucketDetails {
            bucket: BucketResource {
                name: "media".into(),
                location: Some("EU".into()),
                website: Some(Website {
                    main_page_suffix: Some("index.html".into()),
                    not_found_page: None,
                }),
                ..Default::default()
            },
            iam: IamPolicy::default(),
        };

        let pairs = info_pairs(&details);
        assert!(pairs.contains(&("Location", "EU".to_string())));
        assert!(pairs.contains(&("Created", "-".to_string())));
        assert!(pairs.contains(&("Public", "false".to_string())));
        assert!(pairs.contains(&("Main page", "index.html".to_string())));
    }
}
