//! Breadth-first traversal engine.
//!
//! Starting from a seed URL, pages are fetched one at a time in FIFO order.
//! All traversal state (frontier, visited set, content map) is owned by a
//! single [`Crawler::crawl`] call and dropped when it returns.
//!
//! A frontier entry is discarded at dequeue time when its URL was already
//! processed or its depth exceeds the limit, so the same URL may sit in the
//! frontier several times but is fetched at most once. A page that fails to
//! fetch is reported and skipped; the crawl itself never fails.

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};
use url::Url;

use webdigest_shared::{ContentMap, CrawlConfig, CrawlReport, FetchError, FetchedPage, LinkBase};

use crate::fetch::Fetcher;
use crate::scope::CrawlScope;

/// Receives per-page crawl events.
pub trait CrawlObserver {
    /// A page was fetched; `fetched` pages so far, `queued` frontier entries left.
    fn page_fetched(&self, _url: &Url, _fetched: usize, _queued: usize) {}
    /// A page could not be fetched and was skipped.
    fn page_failed(&self, _error: &FetchError) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl CrawlObserver for NoopObserver {}

#[derive(Debug)]
struct FrontierEntry {
    url: Url,
    depth: u32,
}

/// Depth-bounded breadth-first crawler over any [`Fetcher`].
pub struct Crawler<F> {
    fetcher: F,
    config: CrawlConfig,
}

impl<F: Fetcher> Crawler<F> {
    pub fn new(fetcher: F, config: CrawlConfig) -> Self {
        Self { fetcher, config }
    }

    /// Crawl from `seed`, returning the visited pages in breadth-first order.
    #[instrument(skip_all, fields(seed = %seed, max_depth = self.config.max_depth))]
    pub async fn crawl(
        &self,
        seed: &Url,
        observer: &dyn CrawlObserver,
    ) -> (CrawlReport, ContentMap) {
        let start_time = Instant::now();
        let max_depth = self.config.max_depth;

        let mut seed = seed.clone();
        seed.set_fragment(None);

        let scope = CrawlScope::new(&seed, &self.config);
        let mut frontier = VecDeque::from([FrontierEntry {
            url: seed.clone(),
            depth: 0,
        }]);
        let mut visited: HashSet<Url> = HashSet::new();
        let mut failed: HashSet<Url> = HashSet::new();
        let mut content = ContentMap::new();
        let mut report = CrawlReport::default();

        info!(link_base = %self.config.link_base, "starting crawl");

        while let Some(FrontierEntry { url, depth }) = frontier.pop_front() {
            if depth > max_depth || visited.contains(&url) || failed.contains(&url) {
                report.entries_discarded += 1;
                continue;
            }

            debug!(%url, depth, "fetching page");

            let page = match self.fetcher.fetch(&url).await {
                Ok(page) => page,
                Err(error) => {
                    warn!(url = %error.url, error = %error.message, "fetch failed, skipping page");
                    observer.page_failed(&error);
                    failed.insert(url);
                    report.failures.push(error);
                    continue;
                }
            };

            let FetchedPage {
                url: served_url,
                content: text,
                links,
            } = page;

            // Keyed by the requested URL; redirects only affect link resolution
            content.insert(url.clone(), text);
            visited.insert(url.clone());
            observer.page_fetched(&url, content.len(), frontier.len());

            let base = match self.config.link_base {
                LinkBase::Seed => &seed,
                LinkBase::Page => &served_url,
            };

            for href in &links {
                let Some(link) = resolve_link(base, href) else {
                    continue;
                };
                if visited.contains(&link) {
                    continue;
                }
                if let Err(reason) = scope.check(&link) {
                    debug!(%link, %reason, "link skipped");
                    report.links_out_of_scope += 1;
                    continue;
                }
                frontier.push_back(FrontierEntry {
                    url: link,
                    depth: depth + 1,
                });
            }
        }

        report.pages_fetched = content.len();
        report.duration = start_time.elapsed();

        info!(
            pages_fetched = report.pages_fetched,
            entries_discarded = report.entries_discarded,
            links_out_of_scope = report.links_out_of_scope,
            failures = report.failures.len(),
            duration_ms = report.duration.as_millis(),
            "crawl completed"
        );

        (report, content)
    }
}

/// Resolve `href` against `base` into an absolute URL without fragment.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let mut resolved = base.join(href.trim()).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}
