//! Shared types, error model, and configuration for webdigest.
//!
//! This crate is the foundation depended on by all other webdigest crates.
//! It provides:
//! - [`WebdigestError`] and [`FetchError`], the error taxonomy
//! - Domain types ([`ContentMap`], [`FetchedPage`], [`CrawlReport`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], [`LlmConfig`], [`PdfConfig`]) and the config file

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, CrawlSection, DefaultsConfig, LinkBase, LlmConfig, LlmSection,
    PdfConfig, PdfSection,
};
pub use error::{FetchError, Result, WebdigestError};
pub use types::{ContentMap, CrawlReport, FetchedPage};
