//! rm command - Remove objects

use clap::Args;
use gsz_core::{ObjectStore as _, traits::DEFAULT_DELETE_CONCURRENCY};
use serde::Serialize;

use super::{Context, client_or_exit, fail, remote_arg};
use crate::exit_code::ExitCode;

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Object, or prefix with --recursive (bucket/key)
    pub path: String,

    /// Remove every object under the prefix
    #[arg(short, long)]
    pub recursive: bool,

    /// Parallel deletes for --recursive
    #[arg(long, default_value_t = DEFAULT_DELETE_CONCURRENCY)]
    pub concurrency: usize,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    success: bool,
    path: String,
    removed: usize,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();
    let path = match remote_arg(&formatter, &args.path) {
        Ok(path) => path,
        Err(code) => return code,
    };
    if !args.recursive
        && let Err(e) = path.require_object()
    {
        return fail(&formatter, &e);
    }

    let client = match client_or_exit(ctx, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let removed = if args.recursive {
        match client.delete_prefix(&path, args.concurrency).await {
            Ok(count) => count,
            Err(e) => return fail(&formatter, &e),
        }
    } else {
        match client.delete_object(&path).await {
            Ok(true) => 1,
            Ok(false) => {
                formatter.error(&format!("Object not found: {path}"));
                return ExitCode::NotFound;
            }
            Err(e) => return fail(&formatter, &e),
        }
    };

    if formatter.is_json() {
        formatter.json(&RmOutput {
            success: true,
            path: path.to_string(),
            removed,
        });
    } else if args.recursive {
        formatter.success(&format!("Removed {removed} object(s) under '{path}'."));
    } else {
        formatter.success(&format!("Removed '{path}'."));
    }
    ExitCode::Success
}
