//! End-to-end digest pipeline: seed URL → crawl → transform each page → PDF.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument};
use url::Url;

use webdigest_crawler::{CrawlObserver, Crawler, Fetcher};
use webdigest_llm::ContentTransformer;
use webdigest_pdf::DocumentRenderer;
use webdigest_shared::{CrawlConfig, FetchError, Result, WebdigestError};

/// Configuration for the digest pipeline.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Seed URL.
    pub url: Url,
    /// Instruction applied to every page.
    pub prompt: String,
    /// Where the PDF is written.
    pub output: PathBuf,
    /// Crawl configuration.
    pub crawl: CrawlConfig,
}

/// Result of a completed digest run.
#[derive(Debug)]
pub struct DigestResult {
    /// Path of the written PDF.
    pub output: PathBuf,
    /// Pages fetched successfully.
    pub pages_crawled: usize,
    /// Pages passed through the transformer.
    pub pages_transformed: usize,
    /// Pages skipped because they could not be fetched.
    pub failures: Vec<FetchError>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a page is fetched during the crawl.
    fn page_fetched(&self, url: &str, fetched: usize, queued: usize);
    /// Called when a page fetch fails and the page is skipped.
    fn page_failed(&self, url: &str, message: &str);
    /// Called when a page has been transformed.
    fn page_transformed(&self, url: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &DigestResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_fetched(&self, _url: &str, _fetched: usize, _queued: usize) {}
    fn page_failed(&self, _url: &str, _message: &str) {}
    fn page_transformed(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &DigestResult) {}
}

/// Run the full digest pipeline.
///
/// 1. Crawl breadth-first from the seed
/// 2. Transform each page, in crawl order, with the user's instruction
/// 3. Concatenate `## <url>` sections and render them once to PDF
///
/// Fetch failures only skip the page. A transformer or renderer failure
/// aborts the run before anything is written. An empty crawl is reported as
/// [`WebdigestError::EmptyCrawl`].
#[instrument(skip_all, fields(url = %config.url, output = %config.output.display()))]
pub async fn run_digest<F, T, R>(
    config: &DigestConfig,
    fetcher: F,
    transformer: &T,
    renderer: &R,
    progress: &dyn ProgressReporter,
) -> Result<DigestResult>
where
    F: Fetcher,
    T: ContentTransformer,
    R: DocumentRenderer,
{
    let start = Instant::now();
    info!(max_depth = config.crawl.max_depth, "starting digest pipeline");

    // --- Phase 1: Crawl ---
    progress.phase("Crawling");
    let crawler = Crawler::new(fetcher, config.crawl.clone());
    let observer = PipelineCrawlProgress { inner: progress };
    let (report, content) = crawler.crawl(&config.url, &observer).await;

    if content.is_empty() {
        return Err(WebdigestError::EmptyCrawl {
            seed: config.url.to_string(),
        });
    }

    // --- Phase 2: Transform ---
    progress.phase("Transforming pages");
    let total = content.len();
    let mut document = String::new();

    for (i, (url, text)) in content.iter().enumerate() {
        let transformed = transformer.transform(text, &config.prompt).await?;
        push_section(&mut document, url, &transformed);
        progress.page_transformed(url.as_str(), i + 1, total);
    }

    // --- Phase 3: Render ---
    progress.phase("Rendering PDF");
    renderer.render(&document, &config.output)?;

    let result = DigestResult {
        output: config.output.clone(),
        pages_crawled: report.pages_fetched,
        pages_transformed: total,
        failures: report.failures,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        pages_crawled = result.pages_crawled,
        pages_transformed = result.pages_transformed,
        failures = result.failures.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "digest pipeline complete"
    );

    Ok(result)
}

/// Append one `## <url>` section to the document.
fn push_section(document: &mut String, url: &Url, text: &str) {
    if !document.is_empty() {
        document.push('\n');
    }
    document.push_str("## ");
    document.push_str(url.as_str());
    document.push_str("\n\n");
    document.push_str(text.trim_end());
    document.push('\n');
}

// ---------------------------------------------------------------------------
// Crawl progress adapter
// ---------------------------------------------------------------------------

/// Adapts a `ProgressReporter` to the `CrawlObserver` interface.
struct PipelineCrawlProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl CrawlObserver for PipelineCrawlProgress<'_> {
    fn page_fetched(&self, url: &Url, fetched: usize, queued: usize) {
        self.inner.page_fetched(url.as_str(), fetched, queued);
    }

    fn page_failed(&self, error: &FetchError) {
        self.inner.page_failed(&error.url, &error.message);
    }
}
