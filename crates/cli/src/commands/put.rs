//! put command - Upload a local file
//!
//! A destination ending in `/` (or naming only a bucket) receives the
//! local file name.

use std::path::Path;

use bytes::Bytes;
use clap::Args;
use gsz_core::{ObjectInfo, ObjectStore as _, RemotePath};
use serde::Serialize;

use super::{Context, client_or_exit, fail, remote_arg};
use crate::exit_code::ExitCode;

#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to upload
    pub source: String,

    /// Destination (bucket[/key])
    pub target: String,

    /// Content type; guessed from the key when omitted
    #[arg(long)]
    pub content_type: Option<String>,

    /// Make the uploaded object publicly readable
    #[arg(long)]
    pub public: bool,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    #[serde(flatten)]
    object: ObjectInfo,
    uri: String,
    public_url: String,
    public: bool,
}

/// Object key for an upload: a bucket or folder target takes the file name
fn upload_target(target: RemotePath, source: &Path) -> RemotePath {
    let folder = target.is_bucket() || target.key.ends_with('/');
    match source.file_name().and_then(|name| name.to_str()) {
        Some(name) if folder => target.join(name),
        _ => target,
    }
}

/// Execute the put command
pub async fn execute(args: PutArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();
    let source = Path::new(&args.source);
    let target = match remote_arg(&formatter, &args.target) {
        Ok(path) => upload_target(path, source),
        Err(code) => return code,
    };

    let data = match tokio::fs::read(source).await {
        Ok(data) => Bytes::from(data),
        Err(e) => {
            formatter.error(&format!("Failed to read '{}': {e}", source.display()));
            return ExitCode::UsageError;
        }
    };

    let client = match client_or_exit(ctx, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let object = match client
        .put_object(&target, data, args.content_type.as_deref())
        .await
    {
        Ok(object) => object,
        Err(e) => return fail(&formatter, &e),
    };

    if args.public
        && let Err(e) = client.add_public_access(&target).await
    {
        formatter.warning(&format!("Uploaded, but could not make it public: {e}"));
        return ExitCode::from_error(&e);
    }

    let public_url = client.public_url(&target);
    if formatter.is_json() {
        formatter.json(&PutOutput {
            object,
            uri: target.to_string(),
            public_url,
            public: args.public,
        });
    } else {
        let size = object.size_human.clone().unwrap_or_default();
        formatter.success(&format!(
            "{} -> {} ({})",
            source.display(),
            target,
            formatter.style_size(&size)
        ));
        if args.public {
            formatter.println(&formatter.style_url(&public_url));
        }
    }
    ExitCode::Success
}
