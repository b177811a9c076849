//! Error types for webdigest.
//!
//! Library crates use [`WebdigestError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Fetch failures are the only recoverable kind: the traversal logs them and
//! moves on. Everything else aborts the run.

use std::path::PathBuf;

/// A single page could not be fetched. Recovered by the traversal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to fetch {url}: {message}")]
pub struct FetchError {
    /// The page that failed.
    pub url: String,
    /// Human-readable cause (HTTP status, transport error, ...).
    pub message: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Top-level error type for all webdigest operations.
#[derive(Debug, thiserror::Error)]
pub enum WebdigestError {
    /// Page fetch failure surfaced to a direct caller of a fetcher.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Remote language-model call failed or returned an unusable body.
    #[error("transform error: {0}")]
    Transform(String),

    /// PDF generation or writing failed.
    #[error("render error: {0}")]
    Render(String),

    /// The crawl produced no pages, so there is nothing to transform.
    #[error("no pages were fetched starting from {seed}")]
    EmptyCrawl { seed: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A URL given by the user could not be parsed.
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WebdigestError>;

impl WebdigestError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the pipeline may skip past this error and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}
