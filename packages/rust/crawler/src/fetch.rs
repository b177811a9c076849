//! Page fetching: the [`Fetcher`] seam and its HTTP implementation.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use webdigest_shared::{CrawlConfig, FetchError, FetchedPage, Result, WebdigestError};

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("webdigest/", env!("CARGO_PKG_VERSION"));

/// Href prefixes that never point at a crawlable page.
const SKIPPED_HREF_PREFIXES: [&str; 5] = ["#", "javascript:", "mailto:", "tel:", "data:"];

/// Fetches one page and returns its extracted text and raw hyperlinks.
///
/// A failure affects only the page that was requested.
pub trait Fetcher {
    fn fetch(
        &self,
        url: &Url,
    ) -> impl Future<Output = std::result::Result<FetchedPage, FetchError>> + Send;
}

/// Fetcher backed by `reqwest` and the Markdown extractor.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WebdigestError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> std::result::Result<FetchedPage, FetchError> {
        let fail = |message: String| FetchError::new(url.as_str(), message);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {status}")));
        }

        // Redirects are followed, so this may differ from `url`
        let served_url = response.url().clone();

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();

        let body = response
            .text()
            .await
            .map_err(|e| fail(format!("body read failed: {e}")))?;

        debug!(
            status = status.as_u16(),
            %served_url,
            %content_type,
            bytes = body.len(),
            "page fetched"
        );

        if content_type.contains("html") {
            let content = webdigest_markdown::convert(&body, &served_url)
                .map_err(|e| fail(e.to_string()))?;
            let links = extract_links(&Html::parse_document(&body));
            return Ok(FetchedPage {
                url: served_url,
                content,
                links,
            });
        }

        if content_type.starts_with("text/") {
            return Ok(FetchedPage {
                url: served_url,
                content: body,
                links: Vec::new(),
            });
        }

        Err(fail(format!("unsupported content type '{content_type}'")))
    }
}

/// Raw `href` values of every `<a href>` on the page, first occurrence only.
fn extract_links(doc: &Html) -> Vec<String> {
    let Ok(link_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links: Vec<String> = Vec::new();
    for href in doc.select(&link_sel).filter_map(|el| el.value().attr("href")) {
        let href = href.trim();
        if href.is_empty()
            || SKIPPED_HREF_PREFIXES
                .iter()
                .any(|p| href.to_ascii_lowercase().starts_with(p))
        {
            continue;
        }
        if !links.iter().any(|l| l == href) {
            links.push(href.to_string());
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn extract_links_keeps_raw_hrefs() {
        let html = r##"<html><body>
            <a href="/page2">Page 2</a>
            <a href="https://external.com">External</a>
            <a href="#section">Anchor</a>
            <a href="relative/path">Relative</a>
            <a href="mailto:team@example.com">Mail</a>
            <a href="JavaScript:void(0)">JS</a>
            <a href="/page2">Page 2 again</a>
        </body></html>"##;

        let links = extract_links(&Html::parse_document(html));
        assert_eq!(links, ["/page2", "https://external.com", "relative/path"]);
    }

    #[tokio::test]
    async fn fetch_html_page_returns_markdown_and_links() {
        let server = MockServer::start().await;
        let page = r#"<html><head><title>Home</title></head><body>
            <nav><a href="/about">About</a></nav>
            <main><h1>Welcome</h1><p>Hello from the home page.</p></main>
        </body></html>"#;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(page.as_bytes(), "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&CrawlConfig::default()).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let fetched = fetcher.fetch(&url).await.unwrap();

        assert_eq!(fetched.url, url);
        assert!(fetched.content.contains("Hello from the home page."));
        assert!(!fetched.content.contains("About"));
        assert_eq!(fetched.links, ["/about"]);
    }

    #[tokio::test]
    async fn redirected_page_reports_the_url_it_was_served_from() {
        let server = MockServer::start().await;
        Mock::given(path("/docs"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/docs/"))
            .mount(&server)
            .await;
        Mock::given(path("/docs/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<html><body><main><p>See <a href="intro">the intro</a>.</p></main></body></html>"#
                    .as_bytes(),
                "text/html",
            ))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&CrawlConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/docs", server.uri())).unwrap();
        let fetched = fetcher.fetch(&url).await.unwrap();

        assert_eq!(fetched.url.path(), "/docs/");
        assert_eq!(fetched.links, ["intro"]);
        let intro = format!("({}/docs/intro)", server.uri());
        assert!(fetched.content.contains(&intro), "content: {}", fetched.content);
    }

    #[tokio::test]
    async fn fetch_plain_text_has_no_links() {
        let server = MockServer::start().await;
        Mock::given(path("/notes.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("just <a href=\"/x\">text</a>".as_bytes(), "text/plain"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&CrawlConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/notes.txt", server.uri())).unwrap();
        let fetched = fetcher.fetch(&url).await.unwrap();

        assert!(fetched.links.is_empty());
        assert!(fetched.content.starts_with("just"));
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&CrawlConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert_eq!(err.url, url.as_str());
        assert!(err.message.contains("404"), "message: {}", err.message);
    }

    #[tokio::test]
    async fn binary_content_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(path("/logo.png"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&CrawlConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/logo.png", server.uri())).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(err.message.contains("unsupported content type"));
    }
}
