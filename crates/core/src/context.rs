//! Listing context and page query parameters
//!
//! The rendered page links back to itself with `?bucket=<b>&prefix=<p>`.
//! [`ListingContext`] carries everything those links need, and
//! [`QueryParams`] reads the same parameters back from a raw query string.

use serde::{Deserialize, Serialize};

/// Which bucket is being listed and where the listing page lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingContext {
    /// Bucket identifier used in `?bucket=` and as the breadcrumb root label
    pub bucket: String,

    /// Base URL of the bucket's listing endpoint (no trailing slash)
    pub bucket_url: String,

    /// URL of the listing page itself; directory links are built against it.
    /// Empty means links stay relative to the current page.
    #[serde(default)]
    pub page_url: String,
}

impl ListingContext {
    pub fn new(bucket: impl Into<String>, bucket_url: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            bucket_url: bucket_url.into().trim_end_matches('/').to_string(),
            page_url: String::new(),
        }
    }

    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = page_url.into();
        self
    }

    /// Relative query that re-opens the listing at `encoded_prefix`
    pub fn listing_query(&self, encoded_prefix: &str) -> String {
        format!(
            "?bucket={}&prefix={}",
            urlencoding::encode(&self.bucket),
            encoded_prefix
        )
    }

    /// Absolute link to the listing at `encoded_prefix`
    pub fn listing_href(&self, encoded_prefix: &str) -> String {
        format!("{}{}", self.page_url, self.listing_query(encoded_prefix))
    }

    /// Direct link to an object
    pub fn object_href(&self, encoded_key: &str) -> String {
        format!("{}/{}", self.bucket_url, encoded_key)
    }

    /// `<base href>` value: the page URL with a trailing slash
    pub fn base_href(&self) -> Option<String> {
        if self.page_url.is_empty() {
            return None;
        }
        if self.page_url.ends_with('/') {
            Some(self.page_url.clone())
        } else {
            Some(format!("{}/", self.page_url))
        }
    }
}

/// `bucket` and `prefix` taken from a listing page query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub bucket: Option<String>,

    /// Decoded prefix
    pub prefix: Option<String>,
}

impl QueryParams {
    /// Parse a raw query string, with or without the leading `?`.
    ///
    /// `bucket` is read with standard form decoding. `prefix` is matched on
    /// the raw string: the last `prefix=` parameter with a non-empty value,
    /// up to the next `&`.
    pub fn parse(query: &str) -> Self {
        let form = query.strip_prefix('?').unwrap_or(query);

        let bucket = url::form_urlencoded::parse(form.as_bytes())
            .find(|(k, _)| k == "bucket")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty());

        let anchored = format!("?{form}");
        let prefix = raw_prefix(&anchored).map(|raw| match urlencoding::decode(raw) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => raw.to_string(),
        });

        Self { bucket, prefix }
    }
}

fn raw_prefix(query: &str) -> Option<&str> {
    const KEY: &str = "prefix=";

    query
        .match_indices(['?', '&'])
        .filter_map(|(pos, _)| query[pos + 1..].strip_prefix(KEY))
        .map(|rest| rest.split('&').next().unwrap_or_default())
        .filter(|value| !value.is_empty())
        .last()
}
