//! Core domain types for a crawl run.

use std::collections::HashMap;
use std::time::Duration;

use url::Url;

use crate::error::FetchError;

// ---------------------------------------------------------------------------
// FetchedPage
// ---------------------------------------------------------------------------

/// A successfully fetched page, as returned by a fetcher.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL the content was served from, after any redirects.
    pub url: Url,
    /// Extracted text content (Markdown).
    pub content: String,
    /// Hyperlinks as written on the page (not yet resolved).
    pub links: Vec<String>,
}

// ---------------------------------------------------------------------------
// ContentMap
// ---------------------------------------------------------------------------

/// Ordered map from visited URL to extracted content.
///
/// Iteration order is insertion order. Entries are never replaced or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentMap {
    entries: Vec<(Url, String)>,
    index: HashMap<Url, usize>,
}

impl ContentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `url → content`. Returns `false` (and keeps the existing entry)
    /// if `url` is already present.
    pub fn insert(&mut self, url: Url, content: String) -> bool {
        if self.index.contains_key(&url) {
            return false;
        }
        self.index.insert(url.clone(), self.entries.len());
        self.entries.push((url, content));
        true
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.index.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Url, &str)> {
        self.entries.iter().map(|(u, c)| (u, c.as_str()))
    }

    /// Keys in insertion order.
    pub fn urls(&self) -> impl Iterator<Item = &Url> {
        self.entries.iter().map(|(u, _)| u)
    }
}

impl IntoIterator for ContentMap {
    type Item = (Url, String);
    type IntoIter = std::vec::IntoIter<(Url, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ---------------------------------------------------------------------------
// CrawlReport
// ---------------------------------------------------------------------------

/// Summary of a completed traversal.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Number of pages successfully fetched.
    pub pages_fetched: usize,
    /// Frontier entries discarded at dequeue (already visited or too deep).
    pub entries_discarded: usize,
    /// Discovered links dropped because they were out of scope.
    pub links_out_of_scope: usize,
    /// Pages that could not be fetched.
    pub failures: Vec<FetchError>,
    /// Total duration of the traversal.
    pub duration: Duration,
}
