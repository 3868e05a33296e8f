//! s3-index - directory listings for public S3 buckets
//!
//! Renders the delimiter listing of a bucket prefix as a browsable HTML page
//! or a plain text table.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use s3_index::commands::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the listing
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
