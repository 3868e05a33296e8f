//! Pagination over truncated listings
//!
//! A listing is fetched page by page following the marker chain, one request
//! at a time. [`ListingPages`] yields the parsed pages lazily; [`Aggregator`]
//! drives it to completion, rendering each page as it arrives and
//! concatenating the blocks in marker order.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::context::ListingContext;
use crate::error::{Error, Result};
use crate::listing::{Entry, ListingPage, Marker, parse_listing};
use crate::render::{Markup, render_page};
use crate::request::{Proxy, build_listing_url, normalize_prefix};

/// Default deadline for a single listing request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport used to retrieve listing documents
///
/// Implemented over HTTP by `si-http`; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the response body. Non-2xx responses are errors.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Lazy sequence of listing pages for one prefix
pub struct ListingPages<'a> {
    fetcher: &'a dyn PageFetcher,
    proxy: &'a dyn Proxy,
    bucket_url: &'a str,
    prefix: String,
    timeout: Duration,
    marker: Option<Marker>,
    seen_markers: HashSet<String>,
    requests: usize,
    finished: bool,
}

impl<'a> ListingPages<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        proxy: &'a dyn Proxy,
        bucket_url: &'a str,
        prefix: &str,
    ) -> Self {
        Self {
            fetcher,
            proxy,
            bucket_url,
            prefix: normalize_prefix(prefix),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            marker: None,
            seen_markers: HashSet::new(),
            requests: 0,
            finished: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of requests issued so far
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Fetch and parse the next page.
    ///
    /// Returns `None` once a page without a continuation marker has been
    /// returned, or after an error.
    pub async fn next_page(&mut self) -> Option<Result<ListingPage>> {
        if self.finished {
            return None;
        }

        let url = build_listing_url(
            self.bucket_url,
            &self.prefix,
            self.marker.as_ref(),
            self.proxy,
        );
        self.requests += 1;
        tracing::debug!(page = self.requests, %url, "Fetching listing page");

        let body = match tokio::time::timeout(self.timeout, self.fetcher.fetch(&url)).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                self.finished = true;
                return Some(Err(e));
            }
            Err(_) => {
                self.finished = true;
                return Some(Err(Error::Timeout(self.timeout)));
            }
        };

        let page = parse_listing(&body);
        tracing::debug!(
            page = self.requests,
            entries = page.entries.len(),
            truncated = page.is_truncated(),
            "Parsed listing page"
        );

        match &page.next_marker {
            Some(next) if !self.seen_markers.insert(next.raw().to_string()) => {
                tracing::warn!(
                    marker = next.raw(),
                    "Server returned a marker already followed, stopping pagination"
                );
                self.finished = true;
            }
            Some(next) => self.marker = Some(next.clone()),
            None => self.finished = true,
        }

        Some(Ok(page))
    }

    /// Adapt into a [`Stream`] of pages
    pub fn into_stream(self) -> impl Stream<Item = Result<ListingPage>> + 'a {
        futures::stream::unfold(self, |mut pages| async move {
            pages.next_page().await.map(|item| (item, pages))
        })
    }
}

/// Terminal state of an aggregated listing
#[derive(Debug)]
pub enum ListingOutcome {
    /// Last page reported no continuation marker
    Complete,
    /// A request failed; pages before it are kept
    Failed(Error),
    /// The cancellation token fired before the listing completed
    Cancelled,
}

/// Rendered output accumulated across all pages of a listing
#[derive(Debug)]
pub struct AggregatedListing {
    /// Normalized prefix that was requested
    pub prefix: String,

    /// Concatenated table blocks, in marker-chain order
    pub text: String,

    /// All entries seen, in page order
    pub entries: Vec<Entry>,

    /// Number of pages rendered
    pub pages: usize,

    pub outcome: ListingOutcome,
}

impl AggregatedListing {
    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, ListingOutcome::Complete)
    }

    pub fn error(&self) -> Option<&Error> {
        match &self.outcome {
            ListingOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

enum State {
    Fetching,
    Accumulating(ListingPage),
    Done,
    Failed(Error),
    Cancelled,
}

/// Drives a listing to completion, one page at a time
pub struct Aggregator<'a> {
    fetcher: &'a dyn PageFetcher,
    proxy: &'a dyn Proxy,
    context: &'a ListingContext,
    markup: Markup,
    timeout: Duration,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        proxy: &'a dyn Proxy,
        context: &'a ListingContext,
    ) -> Self {
        Self {
            fetcher,
            proxy,
            context,
            markup: Markup::Html,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = markup;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch every page under `prefix`
    pub async fn run(&self, prefix: &str, cancel: &CancellationToken) -> AggregatedListing {
        self.run_with(prefix, cancel, |_| {}).await
    }

    /// Fetch every page under `prefix`, calling `on_page` after each page is
    /// parsed and before it is rendered
    pub async fn run_with<F>(
        &self,
        prefix: &str,
        cancel: &CancellationToken,
        mut on_page: F,
    ) -> AggregatedListing
    where
        F: FnMut(&ListingPage),
    {
        let mut pages = ListingPages::new(self.fetcher, self.proxy, &self.context.bucket_url, prefix)
            .with_timeout(self.timeout);

        let mut listing = AggregatedListing {
            prefix: normalize_prefix(prefix),
            text: String::new(),
            entries: Vec::new(),
            pages: 0,
            outcome: ListingOutcome::Complete,
        };

        let mut state = State::Fetching;
        loop {
            state = match state {
                State::Fetching if cancel.is_cancelled() => State::Cancelled,
                State::Fetching => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => State::Cancelled,
                        next = pages.next_page() => match next {
                            Some(Ok(page)) => State::Accumulating(page),
                            Some(Err(e)) => State::Failed(e),
                            None => State::Done,
                        },
                    }
                }
                State::Accumulating(page) => {
                    on_page(&page);
                    listing.text.push_str(&render_page(self.context, &page, self.markup));
                    listing.pages += 1;

                    let more = page.is_truncated();
                    listing.entries.extend(page.entries);

                    if more { State::Fetching } else { State::Done }
                }
                State::Done => {
                    tracing::debug!(
                        pages = listing.pages,
                        entries = listing.entries.len(),
                        "Listing complete"
                    );
                    listing.outcome = ListingOutcome::Complete;
                    break;
                }
                State::Failed(e) => {
                    tracing::warn!(pages = listing.pages, "Listing failed: {e}");
                    listing.outcome = ListingOutcome::Failed(e);
                    break;
                }
                State::Cancelled => {
                    tracing::debug!(pages = listing.pages, "Listing cancelled");
                    listing.outcome = ListingOutcome::Cancelled;
                    break;
                }
            };
        }

        listing
    }
}

/// Fetch and render the complete listing for `prefix` with default options
pub async fn fetch_full_listing(
    fetcher: &dyn PageFetcher,
    proxy: &dyn Proxy,
    context: &ListingContext,
    prefix: &str,
    cancel: &CancellationToken,
) -> AggregatedListing {
    Aggregator::new(fetcher, proxy, context)
        .run(prefix, cancel)
        .await
}
