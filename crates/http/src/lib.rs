//! si-http: HTTP transport for s3-index
//!
//! This crate provides the implementation of the PageFetcher trait
//! using reqwest. It is the only crate that directly depends on an
//! HTTP client.

pub mod client;

pub use client::{HttpConfig, HttpFetcher};
