//! Bucket registry commands
//!
//! A registered bucket maps the identifier used in `?bucket=` links to the
//! base URL its listing is fetched from.

use clap::Subcommand;
use comfy_table::{ContentArrangement, Table, presets::UTF8_BORDERS_ONLY};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use si_core::{Bucket, BucketManager, Error};

/// Bucket subcommands
#[derive(Subcommand, Debug)]
pub enum BucketCommands {
    /// Register a bucket or update its URL
    Set(SetArgs),

    /// List registered buckets
    List(ListArgs),

    /// Remove a registered bucket
    Remove(RemoveArgs),
}

/// Arguments for the `bucket set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Bucket identifier (e.g., "data")
    pub name: String,

    /// Base listing URL (e.g., "https://data.example.com")
    pub url: String,

    /// Fail instead of replacing an existing registration
    #[arg(long)]
    pub no_overwrite: bool,
}

/// Arguments for the `bucket list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Render as a table with a header row
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for the `bucket remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Identifier of the bucket to remove
    pub name: String,
}

#[derive(Serialize)]
struct BucketListOutput {
    buckets: Vec<Bucket>,
}

/// JSON output for set/remove
#[derive(Serialize)]
struct BucketOperationOutput {
    success: bool,
    bucket: String,
    message: String,
}

/// Execute a bucket subcommand
pub fn execute(cmd: BucketCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match BucketManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from(&e);
        }
    };

    match cmd {
        BucketCommands::Set(args) => execute_set(args, &manager, &formatter),
        BucketCommands::List(args) => execute_list(args, &manager, &formatter),
        BucketCommands::Remove(args) => execute_remove(args, &manager, &formatter),
    }
}

fn execute_set(args: SetArgs, manager: &BucketManager, formatter: &Formatter) -> ExitCode {
    let bucket = match Bucket::new(&args.name, &args.url) {
        Ok(b) => b,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    let result = match manager.exists(&args.name) {
        Ok(true) if args.no_overwrite => Err(Error::BucketExists(args.name.clone())),
        Ok(_) => manager.set(bucket),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            let message = format!("Bucket '{}' registered", args.name);
            if formatter.is_json() {
                formatter.json(&BucketOperationOutput {
                    success: true,
                    bucket: args.name,
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

fn execute_list(args: ListArgs, manager: &BucketManager, formatter: &Formatter) -> ExitCode {
    let buckets = match manager.list() {
        Ok(b) => b,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    if formatter.is_json() {
        formatter.json(&BucketListOutput { buckets });
    } else if buckets.is_empty() {
        formatter.println("No buckets registered.");
    } else if args.long {
        formatter.println(&bucket_table(&buckets, formatter.colors_enabled()).to_string());
    } else {
        for bucket in &buckets {
            formatter.println(&format!("{:<12} {}", bucket.name, bucket.url));
        }
    }
    ExitCode::Success
}

fn execute_remove(args: RemoveArgs, manager: &BucketManager, formatter: &Formatter) -> ExitCode {
    match manager.remove(&args.name) {
        Ok(()) => {
            let message = format!("Bucket '{}' removed", args.name);
            if formatter.is_json() {
                formatter.json(&BucketOperationOutput {
                    success: true,
                    bucket: args.name,
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

fn bucket_table(buckets: &[Bucket], styled: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Name", "URL"]);
    if !styled {
        table.force_no_tty();
    }
    for bucket in buckets {
        table.add_row(vec![bucket.name.as_str(), bucket.url.as_str()]);
    }
    table
}
