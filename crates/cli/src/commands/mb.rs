//! mb command - Make a bucket

use clap::Args;
use gsz_core::ObjectStore as _;
use serde::Serialize;

use super::{Context, client_or_exit, fail};
use crate::exit_code::ExitCode;

#[derive(Args, Debug)]
pub struct MbArgs {
    /// Name of the bucket to create
    pub bucket: String,

    /// Succeed without error when the bucket already exists
    #[arg(short = 'p', long)]
    pub ignore_existing: bool,
}

#[derive(Debug, Serialize)]
struct MbOutput {
    success: bool,
    bucket: String,
    created: bool,
}

/// Execute the mb command
pub async fn execute(args: MbArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();
    let bucket = args.bucket.trim_start_matches("gs://").trim_end_matches('/');
    if let Err(e) = gsz_core::validate_bucket_name(bucket) {
        return fail(&formatter, &e);
    }

    let client = match client_or_exit(ctx, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let created = match client.create_bucket(bucket).await {
        Ok(()) => true,
        Err(gsz_core::Error::Conflict(_)) if args.ignore_existing => false,
        Err(e) => return fail(&formatter, &e),
    };

    if formatter.is_json() {
        formatter.json(&MbOutput {
            success: true,
            bucket: bucket.to_string(),
            created,
        });
    } else if created {
        let styled = formatter.style_name(bucket);
        formatter.success(&format!("Bucket '{styled}' created."));
    } else {
        formatter.println(&format!("Bucket '{bucket}' already exists."));
    }
    ExitCode::Success
}
