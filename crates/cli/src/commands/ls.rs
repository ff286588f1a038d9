//! ls command - List buckets or objects
//!
//! Without a path, lists the project's buckets. With a path, lists one
//! level under it (or everything with `--recursive`).

use clap::Args;
use gsz_core::{ListOptions, ObjectInfo, ObjectStore as _, traits::total_size};
use jiff::Timestamp;
use serde::Serialize;

use super::{Context, client_or_exit, fail, remote_arg};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct LsArgs {
    /// Path to list (bucket[/prefix]); omit to list buckets
    pub path: Option<String>,

    /// List every object under the prefix instead of one level
    #[arg(short, long)]
    pub recursive: bool,

    /// Print a total line
    #[arg(long)]
    pub summarize: bool,
}

#[derive(Debug, Serialize)]
struct LsOutput {
    items: Vec<ObjectInfo>,
    count: usize,
    total_size_bytes: u64,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();
    let client = match client_or_exit(ctx, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let result = match &args.path {
        None => client.list_buckets().await,
        Some(input) => {
            let path = match remote_arg(&formatter, input) {
                Ok(path) => path,
                Err(code) => return code,
            };
            let options = ListOptions {
                delimiter: (!args.recursive).then(|| "/".to_string()),
                ..Default::default()
            };
            client.list_all(&path, options).await
        }
    };

    let items = match result {
        Ok(items) => items,
        Err(e) => return fail(&formatter, &e),
    };

    print_items(&formatter, items, args.summarize);
    ExitCode::Success
}

fn print_items(formatter: &Formatter, items: Vec<ObjectInfo>, summarize: bool) {
    let total = total_size(&items);

    if formatter.is_json() {
        formatter.json(&LsOutput {
            count: items.len(),
            total_size_bytes: total,
            items,
        });
        return;
    }

    if items.is_empty() {
        formatter.println("No objects found.");
        return;
    }

    let rows = items.iter().map(|item| row(formatter, item)).collect();
    let table = formatter.table(&["MODIFIED", "SIZE", "NAME"], rows, &[1]);
    formatter.println(&table.to_string());

    if summarize {
        formatter.println(&format!(
            "Total: {} object(s), {}",
            items.len(),
            formatter.style_size(&humansize::format_size(total, humansize::BINARY))
        ));
    }
}

fn format_time(time: Timestamp) -> String {
    time.strftime("%Y-%m-%d %H:%M:%S").to_string()
}

fn row(formatter: &Formatter, item: &ObjectInfo) -> Vec<String> {
    let modified = item.last_modified.map(format_time).unwrap_or_default();
    let size = item.size_human.clone().unwrap_or_default();
    let name = if item.is_dir {
        formatter.style_dir(&item.key)
    } else {
        formatter.style_file(&item.key)
    };
    vec![formatter.style_date(&modified), formatter.style_size(&size), name]
}
