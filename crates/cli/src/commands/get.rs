//! get command - Download an object
//!
//! Streams the object to a local file, or to stdout when no destination
//! (or `-`) is given. `--decode` prints the body as JSON or text instead.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use gsz_core::{ObjectStore as _, RemotePath};
use gsz_gcs::{Body, ContentPolicy};
use serde::Serialize;

use super::{Context, client_or_exit, fail, remote_arg};
use crate::exit_code::ExitCode;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Object to download (bucket/key)
    pub source: String,

    /// Local file or directory; `-` or omitted writes to stdout
    pub target: Option<String>,

    /// Decode the body instead of copying raw bytes
    #[arg(long, value_enum)]
    pub decode: Option<Decode>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Decode {
    Json,
    Text,
}

impl From<Decode> for ContentPolicy {
    fn from(decode: Decode) -> Self {
        match decode {
            Decode::Json => ContentPolicy::Json,
            Decode::Text => ContentPolicy::Text,
        }
    }
}

#[derive(Debug, Serialize)]
struct GetOutput {
    source: String,
    target: String,
    size_bytes: u64,
}

/// Local file for a download: directories receive the object's file name
fn local_target(target: &Path, source: &RemotePath) -> PathBuf {
    match source.file_name() {
        Some(name) if target.is_dir() => target.join(name),
        _ => target.to_path_buf(),
    }
}

/// Execute the get command
pub async fn execute(args: GetArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();
    let source = match remote_arg(&formatter, &args.source) {
        Ok(path) => path,
        Err(code) => return code,
    };
    if let Err(e) = source.require_object() {
        return fail(&formatter, &e);
    }
    let client = match client_or_exit(ctx, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    if let Some(decode) = args.decode {
        return match client.get_object_body(&source, decode.into()).await {
            Ok(Body::Json(value)) => {
                formatter.json(&value);
                ExitCode::Success
            }
            Ok(Body::Text(text)) => {
                formatter.println(&text);
                ExitCode::Success
            }
            Ok(Body::Bytes(_)) => ExitCode::Success,
            Err(e) => fail(&formatter, &e),
        };
    }

    match args.target.as_deref() {
        None | Some("-") => {
            let mut stdout = tokio::io::stdout();
            match client.get_object_to(&source, &mut stdout).await {
                Ok(_) => ExitCode::Success,
                Err(e) => fail(&formatter, &e),
            }
        }
        Some(target) => {
            let path = local_target(Path::new(target), &source);
            let mut file = match tokio::fs::File::create(&path).await {
                Ok(file) => file,
                Err(e) => return fail(&formatter, &gsz_core::Error::from(e)),
            };

            match client.get_object_to(&source, &mut file).await {
                Ok(size) => {
                    if formatter.is_json() {
                        formatter.json(&GetOutput {
                            source: source.to_string(),
                            target: path.display().to_string(),
                            size_bytes: size,
                        });
                    } else {
                        formatter.success(&format!(
                            "{} -> {} ({})",
                            source,
                            path.display(),
                            formatter.style_size(&humansize::format_size(size, humansize::BINARY))
                        ));
                    }
                    ExitCode::Success
                }
                Err(e) => {
                    // Do not leave a truncated file behind
                    let _ = tokio::fs::remove_file(&path).await;
                    fail(&formatter, &e)
                }
            }
        }
    }
}
