//! rb command - Remove a bucket

use clap::Args;
use gsz_core::ObjectStore as _;
use serde::Serialize;

use super::{Context, client_or_exit, fail};
use crate::exit_code::ExitCode;

#[derive(Args, Debug)]
pub struct RbArgs {
    /// Name of the bucket to remove
    pub bucket: String,

    /// Delete every object in the bucket first
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct RbOutput {
    success: bool,
    bucket: String,
    objects_removed: usize,
}

/// Execute the rb command
pub async fn execute(args: RbArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();
    let bucket = args.bucket.trim_start_matches("gs://").trim_end_matches('/');
    let client = match client_or_exit(ctx, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let result = if args.force {
        client.delete_bucket_force(bucket).await
    } else {
        client.delete_bucket(bucket).await.map(|()| 0)
    };

    match result {
        Ok(removed) => {
            if formatter.is_json() {
                formatter.json(&RbOutput {
                    success: true,
                    bucket: bucket.to_string(),
                    objects_removed: removed,
                });
            } else {
                let styled = formatter.style_name(bucket);
                formatter.success(&format!("Bucket '{styled}' removed."));
            }
            ExitCode::Success
        }
        Err(gsz_core::Error::Conflict(message)) if !args.force => {
            formatter.error(&format!("Bucket '{bucket}' is not empty: {message}"));
            formatter.println("Use --force to delete its objects first.");
            ExitCode::Conflict
        }
        Err(e) => fail(&formatter, &e),
    }
}
