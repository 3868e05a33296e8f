//! Listing pages and the `ListBucketResult` parser
//!
//! One HTTP response of a delimiter listing becomes one [`ListingPage`]:
//! virtual directories from `<CommonPrefixes>` first, then objects from
//! `<Contents>`, plus the continuation marker when the response is truncated.

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

/// Whether an entry is an object or a virtual directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One row of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Full object key or common prefix
    pub key: String,

    /// ISO-8601 timestamp as sent by the server (empty for directories)
    pub last_modified: String,

    /// Size in bytes (0 for directories)
    pub size_bytes: u64,

    pub kind: EntryKind,
}

impl Entry {
    /// Create a file entry
    pub fn file(key: impl Into<String>, last_modified: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            key: key.into(),
            last_modified: last_modified.into(),
            size_bytes,
            kind: EntryKind::File,
        }
    }

    /// Create a directory entry from a common prefix
    pub fn directory(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            last_modified: String::new(),
            size_bytes: 0,
            kind: EntryKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Text shown in the size column
    pub fn size_display(&self) -> String {
        match self.kind {
            EntryKind::Directory => "0".to_string(),
            EntryKind::File => human_readable_size(self.size_bytes),
        }
    }

    /// Parsed last-modified time, if the server sent a valid RFC 3339 value
    pub fn modified_at(&self) -> Option<jiff::Timestamp> {
        self.last_modified.parse().ok()
    }
}

/// Continuation token for the next page of a truncated listing.
///
/// Kept in both raw and percent-encoded form; the encoded form is what goes
/// into the next request URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    raw: String,
    encoded: String,
}

impl Marker {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let encoded = urlencoding::encode(&raw).into_owned();
        Self { raw, encoded }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

/// Parsed result of one listing response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPage {
    /// Virtual directory this page lists (empty at the bucket root)
    pub prefix: String,

    /// Directories first, then files, each in document order
    pub entries: Vec<Entry>,

    /// Present iff the response was truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_marker: Option<Marker>,
}

impl ListingPage {
    pub fn directories(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_dir())
    }

    pub fn files(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| !e.is_dir())
    }

    pub fn is_truncated(&self) -> bool {
        self.next_marker.is_some()
    }
}

#[derive(Default)]
struct RawContents {
    key: String,
    last_modified: String,
    size: String,
}

/// Parse a `ListBucketResult` document.
///
/// Never fails: missing elements become empty strings or zero, and a
/// malformed document yields whatever was read before the error.
pub fn parse_listing(xml: &str) -> ListingPage {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();

    let mut prefix: Option<String> = None;
    let mut is_truncated: Option<bool> = None;
    let mut next_marker: Option<String> = None;
    let mut contents: Vec<RawContents> = Vec::new();
    let mut current = RawContents::default();
    let mut common_prefixes: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                text.clear();
            }
            Ok(Event::Text(ref e)) => match e.unescape() {
                Ok(t) => text.push_str(&t),
                Err(err) => {
                    tracing::warn!("Skipping undecodable text in listing: {err}");
                }
            },
            Ok(Event::CData(ref e)) => {
                text.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::End(_)) => {
                let value = std::mem::take(&mut text);
                let inner: Vec<&str> = path.iter().skip(1).map(String::as_str).collect();
                match inner.as_slice() {
                    ["Prefix"] if prefix.is_none() => prefix = Some(value),
                    ["IsTruncated"] if is_truncated.is_none() => {
                        is_truncated = Some(value.trim() == "true");
                    }
                    ["NextMarker"] if next_marker.is_none() => next_marker = Some(value),
                    ["Contents", "Key"] => current.key = value,
                    ["Contents", "LastModified"] => current.last_modified = value,
                    ["Contents", "Size"] => current.size = value,
                    ["Contents"] => contents.push(std::mem::take(&mut current)),
                    ["CommonPrefixes", "Prefix"] => common_prefixes.push(value),
                    _ => {}
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(
                    "Malformed listing document at byte {}: {e}",
                    reader.buffer_position()
                );
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    let prefix = prefix.unwrap_or_default();

    let next_marker = if is_truncated.unwrap_or(false) {
        match next_marker.filter(|m| !m.is_empty()) {
            Some(marker) => Some(Marker::from_raw(marker)),
            None => fallback_marker(&contents, &common_prefixes),
        }
    } else {
        None
    };

    let mut files: Vec<Entry> = contents
        .into_iter()
        .map(|c| Entry::file(c.key, c.last_modified, c.size.trim().parse().unwrap_or(0)))
        .collect();

    if !prefix.is_empty() && files.first().is_some_and(|f| f.key == prefix) {
        files.remove(0);
    }

    let mut entries: Vec<Entry> = common_prefixes.into_iter().map(Entry::directory).collect();
    entries.extend(files);

    ListingPage {
        prefix,
        entries,
        next_marker,
    }
}

/// Truncated response without `<NextMarker>`: resume after the greatest key
/// or prefix the page returned.
fn fallback_marker(contents: &[RawContents], common_prefixes: &[String]) -> Option<Marker> {
    let last = contents
        .iter()
        .map(|c| c.key.as_str())
        .chain(common_prefixes.iter().map(String::as_str))
        .filter(|k| !k.is_empty())
        .max();

    match last {
        Some(key) => {
            tracing::debug!("Truncated listing without NextMarker, resuming after {key}");
            Some(Marker::from_raw(key))
        }
        None => {
            tracing::warn!("Truncated listing returned no keys, stopping pagination");
            None
        }
    }
}

/// Base-1024 size with one decimal and a unit from kB, MB, GB.
///
/// Always divides at least once, so values below 1 kB show as fractions of
/// a kilobyte, floored at `0.1`.
pub fn human_readable_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["kB", "MB", "GB"];

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value > 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value.max(0.1), UNITS[unit])
}
