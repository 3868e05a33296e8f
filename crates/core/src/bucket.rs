//! Bucket registry
//!
//! Maps the short bucket identifier used in listing links (`?bucket=<name>`)
//! to the bucket's base listing URL.

use serde::{Deserialize, Serialize};

use crate::config::ConfigManager;
use crate::error::{Error, Result};

/// A registered bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Identifier used in `?bucket=` and as the breadcrumb root label
    pub name: String,

    /// Base URL of the bucket listing endpoint
    pub url: String,
}

impl Bucket {
    /// Create a bucket entry, validating the URL
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Config("Bucket name cannot be empty".into()));
        }

        let url = validate_bucket_url(&url.into())?;
        Ok(Self { name, url })
    }
}

/// Check that `url` is an absolute http(s) URL and strip any trailing `/`
pub fn validate_bucket_url(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url)?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::Config(format!(
                "Unsupported URL scheme '{other}', expected http or https"
            )));
        }
    }
    if parsed.query().is_some() {
        return Err(Error::Config(format!(
            "Bucket URL must not contain a query string: {url}"
        )));
    }
    Ok(url.trim_end_matches('/').to_string())
}

/// Manager for registered buckets
pub struct BucketManager {
    config_manager: ConfigManager,
}

impl BucketManager {
    /// Create a new BucketManager with a specific ConfigManager
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Create a new BucketManager using the default config location
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_manager: ConfigManager::new()?,
        })
    }

    /// List all registered buckets
    pub fn list(&self) -> Result<Vec<Bucket>> {
        Ok(self.config_manager.load()?.buckets)
    }

    /// Get a bucket by name
    pub fn get(&self, name: &str) -> Result<Bucket> {
        self.config_manager
            .load()?
            .buckets
            .into_iter()
            .find(|b| b.name == name)
            .ok_or_else(|| Error::BucketNotFound(name.to_string()))
    }

    /// Add or update a bucket
    pub fn set(&self, bucket: Bucket) -> Result<()> {
        let mut config = self.config_manager.load()?;
        config.buckets.retain(|b| b.name != bucket.name);
        config.buckets.push(bucket);
        self.config_manager.save(&config)
    }

    /// Remove a bucket
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let original_len = config.buckets.len();

        config.buckets.retain(|b| b.name != name);

        if config.buckets.len() == original_len {
            return Err(Error::BucketNotFound(name.to_string()));
        }

        self.config_manager.save(&config)
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.list()?.iter().any(|b| b.name == name))
    }
}
