//! zip command - Pack every object under a prefix into one archive
//!
//! The archive is written to a local file (`archive.zip` by default), to
//! stdout with `--output -`, and/or uploaded with `--to`.

use std::path::PathBuf;

use clap::Args;
use gsz_core::pipeline::DEFAULT_ARCHIVE_NAME;
use gsz_core::{
    IgnoreRules, RemoteDestination, RemotePath, Result, ZipDestination, ZipOptions, ZipSummary,
    zip_objects,
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use super::{Context, client_or_exit, fail, remote_arg};
use crate::exit_code::ExitCode;
use crate::output::ZipProgress;

const STDOUT: &str = "-";

#[derive(Args, Debug)]
pub struct ZipArgs {
    /// Bucket or prefix to archive (bucket[/prefix])
    pub source: String,

    /// Object names to leave out: exact names, globs, or `re:<regex>`
    #[arg(short, long = "ignore", value_name = "RULE")]
    pub ignore: Vec<String>,

    /// Local archive file; `-` writes the archive to stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Upload the archive (bucket[/path.zip]); the path defaults to archive.zip
    #[arg(long, value_name = "DEST")]
    pub to: Option<String>,

    /// Objects fetched per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// In-flight fetches within a batch
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Deflate level, 0-9
    #[arg(long)]
    pub level: Option<i64>,
}

#[derive(Debug, Serialize)]
struct ZipOutput {
    success: bool,
    source: String,
    #[serde(flatten)]
    summary: ZipSummary,
}

/// Resolve `--output` and `--to` into a destination
///
/// Returns an empty destination when the archive goes to stdout.
fn destination(output: Option<&PathBuf>, to: Option<&str>) -> Result<ZipDestination> {
    let mut destination = ZipDestination::default();

    match output {
        Some(path) if path.as_os_str() == STDOUT => {}
        Some(path) => destination.local = Some(path.clone()),
        None if to.is_none() => destination.local = Some(PathBuf::from(DEFAULT_ARCHIVE_NAME)),
        None => {}
    }

    if let Some(to) = to {
        let target = RemotePath::parse(to)?;
        destination.remote = Some(RemoteDestination {
            bucket: Some(target.bucket),
            path: (!target.key.is_empty()).then_some(target.key),
        });
    }

    Ok(destination)
}

fn options(args: &ZipArgs, ctx: &Context) -> Result<ZipOptions> {
    let mut options = ZipOptions::from_settings(&ctx.config.zip)
        .ignore(IgnoreRules::parse(&args.ignore)?)
        .destination(destination(args.output.as_ref(), args.to.as_deref())?);

    if let Some(batch_size) = args.batch_size {
        options.batch_size = batch_size;
    }
    if args.concurrency.is_some() {
        options.concurrency = args.concurrency;
    }
    if let Some(level) = args.level {
        options.compression_level = level;
    }
    Ok(options)
}

/// Execute the zip command
pub async fn execute(args: ZipArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();
    let source = match remote_arg(&formatter, &args.source) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let mut options = match options(&args, ctx).and_then(|o| o.validate().map(|()| o)) {
        Ok(options) => options,
        Err(e) => return fail(&formatter, &e),
    };
    let to_stdout = options.destination.is_empty();

    let client = match client_or_exit(ctx, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let progress = formatter.progress_enabled().then(ZipProgress::new);
    if let Some(progress) = &progress {
        options = options.handlers(progress.attach(Default::default()));
    }

    let result = zip_objects(&client, &source, options).await;
    if let Some(progress) = &progress {
        progress.finish();
    }

    let summary = match result {
        Ok(Some(summary)) => summary,
        // Only reachable with an error handler, and none is registered here
        Ok(None) => return ExitCode::GeneralError,
        Err(e) => return fail(&formatter, &e),
    };

    if to_stdout {
        if let Some(data) = &summary.data {
            let mut stdout = tokio::io::stdout();
            let written = match stdout.write_all(data).await {
                Ok(()) => stdout.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                return fail(&formatter, &gsz_core::Error::from(e));
            }
        }
        return ExitCode::Success;
    }

    if formatter.is_json() {
        formatter.json(&ZipOutput {
            success: true,
            source: source.to_string(),
            summary,
        });
    } else {
        formatter.success(&format!(
            "Archived {} object(s) from '{}' ({})",
            summary.count,
            source,
            formatter.style_size(&humansize::format_size(summary.size, humansize::BINARY))
        ));
        for destination in &summary.destinations {
            formatter.println(&format!("  -> {}", formatter.style_file(destination)));
        }
    }
    ExitCode::Success
}
