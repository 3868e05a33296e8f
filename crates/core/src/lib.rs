//! si-core: Core library for s3-index
//!
//! This crate provides the transport-independent pieces of a bucket listing:
//! - Listing request URLs and relay wrapping
//! - `ListBucketResult` parsing
//! - Pagination over truncated listings
//! - Fixed-width table and breadcrumb rendering
//! - Configuration and the bucket registry
//!
//! HTTP lives behind the [`PageFetcher`] trait so that everything here can be
//! tested without a network.

pub mod bucket;
pub mod config;
pub mod context;
pub mod error;
pub mod listing;
pub mod nav;
pub mod page;
pub mod paginate;
pub mod render;
pub mod request;

pub use bucket::{Bucket, BucketManager};
pub use config::{Config, ConfigManager};
pub use context::{ListingContext, QueryParams};
pub use error::{Error, Result};
pub use listing::{Entry, EntryKind, ListingPage, Marker, human_readable_size, parse_listing};
pub use nav::{Breadcrumb, build_breadcrumbs, render_breadcrumbs};
pub use page::{render_document, render_listing_html};
pub use paginate::{
    AggregatedListing, Aggregator, ListingOutcome, ListingPages, PageFetcher, fetch_full_listing,
};
pub use render::{Markup, pad_right, render_page, render_table};
pub use request::{NoProxy, Proxy, RelayProxy, build_listing_url, encode_path};
