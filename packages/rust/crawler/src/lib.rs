//! Breadth-first, depth-bounded web crawler.
//!
//! This crate provides:
//! - [`Fetcher`]: fetch one page, returning its text and raw links
//! - [`HttpFetcher`]: the reqwest-backed fetcher used in production
//! - [`Crawler`]: the traversal engine that drives a fetcher from a seed URL

pub mod engine;
pub mod fetch;
mod scope;

pub use engine::{CrawlObserver, Crawler, NoopObserver, resolve_link};
pub use fetch::{Fetcher, HttpFetcher};
