//! ls command - Render the listing of a bucket prefix
//!
//! Resolves the bucket from the registry, a direct URL, or a listing page
//! query string, fetches every page of the delimiter listing and writes the
//! result as an HTML page, a text table, or JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, ValueEnum};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use si_core::{
    AggregatedListing, Aggregator, Bucket, BucketManager, Config, ConfigManager, Entry, Error,
    ListingContext, ListingOutcome, Markup, NoProxy, Proxy, QueryParams, RelayProxy,
    build_breadcrumbs, render_breadcrumbs, render_document,
};
use si_http::{HttpConfig, HttpFetcher};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, Spinner};

/// Render a bucket listing
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Registered bucket identifier
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Bucket listing URL, used instead of the registry
    #[arg(long)]
    pub url: Option<String>,

    /// Prefix to list (e.g., "logs/2024/")
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Listing page query string to take bucket and prefix from
    /// (e.g., "?bucket=data&prefix=logs%2F")
    #[arg(long)]
    pub query: Option<String>,

    /// Relay prefix prepended to every listing URL
    #[arg(long, conflicts_with = "no_proxy")]
    pub proxy: Option<String>,

    /// Request the bucket directly
    #[arg(long)]
    pub no_proxy: bool,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Accept invalid TLS certificates from the bucket or relay
    #[arg(long)]
    pub insecure: bool,

    /// URL the generated page will be served from
    #[arg(long)]
    pub page_url: Option<String>,

    /// Output format for the listing
    #[arg(long, value_enum, default_value_t = Format::Html)]
    pub format: Format,

    /// Write the listing to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Append totals (text and JSON output)
    #[arg(long)]
    pub summarize: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Standalone HTML page
    Html,
    /// Breadcrumbs and table as plain text
    Text,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput<'a> {
    bucket: &'a str,
    prefix: &'a str,
    entries: &'a [Entry],
    pages: usize,
    complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Summary {
    total_objects: usize,
    total_directories: usize,
    total_size_bytes: u64,
    total_size_human: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest_modified: Option<String>,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (config, registry) = match load_settings() {
        Ok(loaded) => loaded,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from(&e);
        }
    };

    let query = args
        .query
        .as_deref()
        .map(QueryParams::parse)
        .unwrap_or_default();

    let bucket_name = args.bucket.clone().or(query.bucket);
    let bucket = match resolve_bucket(bucket_name, args.url.as_deref(), &registry) {
        Ok(b) => b,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };
    let prefix = args.prefix.clone().or(query.prefix).unwrap_or_default();

    let mut context = ListingContext::new(&bucket.name, &bucket.url);
    if let Some(page_url) = args.page_url.as_ref().or(config.defaults.page_url.as_ref()) {
        context = context.with_page_url(page_url);
    }

    let proxy = resolve_proxy(&args, &config);
    let timeout = Duration::from_secs(args.timeout.unwrap_or(config.defaults.timeout_secs));
    tracing::debug!(
        bucket = %context.bucket,
        url = %context.bucket_url,
        %prefix,
        timeout_secs = timeout.as_secs(),
        "Resolved listing target"
    );

    let fetcher = match HttpFetcher::new(&http_config(&args, timeout)) {
        Ok(f) => f,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    let markup = match args.format {
        Format::Html => Markup::Html,
        Format::Text => Markup::Plain,
    };

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let spinner = Spinner::new(
        formatter.config(),
        &format!("Listing {}/{}", context.bucket, prefix),
    );
    let mut fetched = 0usize;
    let listing = Aggregator::new(&fetcher, proxy.as_ref(), &context)
        .with_markup(markup)
        .with_timeout(timeout)
        .run_with(&prefix, &cancel, |page| {
            fetched += page.entries.len();
            spinner.set_message(&format!(
                "Listing {}/{}: {fetched} entries",
                context.bucket, page.prefix
            ));
        })
        .await;
    spinner.finish_and_clear();
    interrupt.abort();

    if let ListingOutcome::Cancelled = listing.outcome {
        let err = Error::Cancelled;
        formatter.warning(&err.to_string());
        return ExitCode::from(&err);
    }

    let summary = args.summarize.then(|| summarize(&listing.entries));
    let rendered = if formatter.is_json() {
        render_json(&context, &listing, summary)
    } else {
        match args.format {
            Format::Html => {
                let crumbs = build_breadcrumbs(&context, &listing.prefix);
                Ok(render_document(&context, &crumbs, &listing))
            }
            Format::Text => Ok(render_text(&context, &listing, summary.as_ref())),
        }
    };

    let written = rendered
        .context("Failed to serialize listing")
        .and_then(|content| emit(args.output.as_deref(), &content));
    if let Err(e) = written {
        formatter.error(&format!("{e:#}"));
        return ExitCode::GeneralError;
    }

    match listing.error() {
        Some(e) => {
            formatter.error(&format!("Listing incomplete after {} page(s): {e}", listing.pages));
            ExitCode::from(e)
        }
        None => {
            if let Some(path) = &args.output {
                formatter.success(&format!(
                    "Wrote {} entries to {}",
                    listing.entries.len(),
                    path.display()
                ));
            }
            ExitCode::Success
        }
    }
}

fn load_settings() -> si_core::Result<(Config, BucketManager)> {
    let config_manager = ConfigManager::new()?;
    let config = config_manager.load()?;
    Ok((config, BucketManager::with_config_manager(config_manager)))
}

/// Find the bucket to list
///
/// A direct URL wins over the registry. Without an explicit name the URL's
/// host becomes the bucket identifier.
fn resolve_bucket(
    name: Option<String>,
    url: Option<&str>,
    registry: &BucketManager,
) -> si_core::Result<Bucket> {
    match (url, name) {
        (Some(url), Some(name)) => Bucket::new(name, url),
        (Some(url), None) => {
            let parsed = url::Url::parse(url)?;
            let host = parsed.host_str().unwrap_or("bucket").to_string();
            Bucket::new(host, url)
        }
        (None, Some(name)) => registry.get(&name),
        (None, None) => Err(Error::Config(
            "No bucket given: use --bucket, --url, or --query with a bucket parameter".into(),
        )),
    }
}

// Aggregator enforces the per-request deadline
fn http_config(args: &LsArgs, timeout: Duration) -> HttpConfig {
    HttpConfig {
        timeout: timeout + Duration::from_secs(5),
        insecure: args.insecure,
        ..Default::default()
    }
}

fn resolve_proxy(args: &LsArgs, config: &Config) -> Box<dyn Proxy> {
    if args.no_proxy {
        return Box::new(NoProxy);
    }
    let prefix = args.proxy.as_deref().unwrap_or(&config.defaults.proxy);
    if prefix.is_empty() {
        Box::new(NoProxy)
    } else {
        Box::new(RelayProxy::new(prefix))
    }
}

fn summarize(entries: &[Entry]) -> Summary {
    let files = entries.iter().filter(|e| !e.is_dir());
    let total_size_bytes: u64 = files.clone().map(|e| e.size_bytes).sum();
    let latest_modified = files
        .clone()
        .filter_map(Entry::modified_at)
        .max()
        .map(|ts| ts.strftime("%Y-%m-%d %H:%M:%S").to_string());

    Summary {
        total_objects: files.count(),
        total_directories: entries.iter().filter(|e| e.is_dir()).count(),
        total_size_bytes,
        total_size_human: humansize::format_size(total_size_bytes, humansize::BINARY),
        latest_modified,
    }
}

fn render_text(ctx: &ListingContext, listing: &AggregatedListing, summary: Option<&Summary>) -> String {
    let crumbs = build_breadcrumbs(ctx, &listing.prefix);
    let mut out = render_breadcrumbs(ctx, &crumbs, Markup::Plain);
    out.push_str("\n\n");
    out.push_str(&listing.text);

    if let Some(e) = listing.error() {
        out.push_str(&format!("Error: {e}\n"));
    }
    if let Some(s) = summary {
        out.push_str(&format!(
            "\nTotal: {} objects, {} directories, {}\n",
            s.total_objects, s.total_directories, s.total_size_human
        ));
    }
    out
}

fn render_json(
    ctx: &ListingContext,
    listing: &AggregatedListing,
    summary: Option<Summary>,
) -> serde_json::Result<String> {
    let output = LsOutput {
        bucket: &ctx.bucket,
        prefix: &listing.prefix,
        entries: &listing.entries,
        pages: listing.pages,
        complete: listing.is_complete(),
        error: listing.error().map(|e| e.to_string()),
        summary,
    };
    let mut json = serde_json::to_string_pretty(&output)?;
    json.push('\n');
    Ok(json)
}

fn emit(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            use std::io::Write as _;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .and_then(|()| stdout.flush())
                .context("Failed to write to stdout")
        }
    }
}
