//! Listing request URLs
//!
//! Builds the query URL for one page of a delimiter listing and wraps it
//! behind an optional relay so that anonymous requests can go through a
//! CORS-bypass proxy or similar HTTP forwarder.

use crate::listing::Marker;

/// Delimiter used to group keys into virtual directories
pub const DELIMITER: char = '/';

/// Transform applied to every listing URL before it is fetched
pub trait Proxy: Send + Sync {
    /// Return the URL that should actually be requested for `url`
    fn wrap(&self, url: &str) -> String;
}

/// Requests go straight to the bucket endpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProxy;

impl Proxy for NoProxy {
    fn wrap(&self, url: &str) -> String {
        url.to_string()
    }
}

/// Relay that takes the target URL appended verbatim to a fixed prefix,
/// e.g. `https://api.codetabs.com/v1/proxy/?quest=`
#[derive(Debug, Clone)]
pub struct RelayProxy {
    prefix: String,
}

impl RelayProxy {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Proxy for RelayProxy {
    fn wrap(&self, url: &str) -> String {
        format!("{}{}", self.prefix, url)
    }
}

/// Build the (proxied) URL for one listing request.
///
/// `prefix` is the raw, unencoded virtual directory; `marker` is the
/// continuation token from the previous truncated page.
pub fn build_listing_url(
    bucket_url: &str,
    prefix: &str,
    marker: Option<&Marker>,
    proxy: &dyn Proxy,
) -> String {
    let mut url = bucket_url.to_string();
    url.push_str("?delimiter=");
    url.push(DELIMITER);

    let prefix = normalize_prefix(prefix);
    if !prefix.is_empty() {
        url.push_str("&prefix=");
        url.push_str(&encode_path(&prefix));
    }

    if let Some(marker) = marker {
        url.push_str("&marker=");
        url.push_str(marker.encoded());
    }

    proxy.wrap(&url)
}

/// Make a non-empty prefix end with exactly one `/`. A prefix made only of
/// slashes is the bucket root.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches(DELIMITER);
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{trimmed}{DELIMITER}")
}

/// Percent-encode everything except `/`, which is significant to S3.
pub fn encode_path(path: &str) -> String {
    path.split(DELIMITER)
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Prefix one level up, keeping the trailing `/`; empty at the bucket root.
pub fn parent_prefix(prefix: &str) -> String {
    let trimmed = prefix.strip_suffix(DELIMITER).unwrap_or(prefix);
    match trimmed.rfind(DELIMITER) {
        Some(pos) => format!("{}/", &trimmed[..pos]),
        None => String::new(),
    }
}
