//! HTML-to-Markdown text extraction.
//!
//! Pulls the main content out of a fetched HTML page, converts it to Markdown
//! with `htmd`, and runs a series of cleanup passes so the text handed to the
//! language model is compact and readable.

mod cleanup;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use webdigest_shared::{Result, WebdigestError};

/// Tags whose content never reaches the Markdown output.
const SKIPPED_TAGS: [&str; 7] = [
    "script", "style", "nav", "iframe", "noscript", "svg", "form",
];

/// Content containers tried in priority order before falling back to `<body>`.
const CONTENT_SELECTORS: [&str; 5] = ["article", "main", "[role=\"main\"]", ".content", "#content"];

/// Convert an HTML document to cleaned Markdown.
///
/// Relative Markdown links in the output are resolved against `page_url`.
#[instrument(skip(html), fields(url = %page_url, html_len = html.len()))]
pub fn convert(html: &str, page_url: &Url) -> Result<String> {
    let doc = Html::parse_document(html);
    let content_html = select_content_html(&doc).unwrap_or_else(|| html.to_string());
    let content_html = preprocess_tables(&content_html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();

    let raw = converter
        .convert(&content_html)
        .map_err(|e| WebdigestError::Conversion(format!("htmd conversion failed: {e}")))?;

    let markdown = cleanup::run_pipeline(&raw, Some(page_url));
    debug!(markdown_len = markdown.len(), "extracted page text");

    Ok(markdown)
}

/// Inner HTML of the first matching content container, or `<body>`.
fn select_content_html(doc: &Html) -> Option<String> {
    CONTENT_SELECTORS
        .iter()
        .chain(std::iter::once(&"body"))
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|sel| doc.select(&sel).next().map(|el| el.inner_html()))
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Replace `<table>` elements with Markdown pipe tables.
///
/// `htmd` 0.1 flattens tables into loose text, so they are rendered here first.
fn preprocess_tables(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let Ok(table_sel) = Selector::parse("table") else {
        return html.to_string();
    };

    let mut result = html.to_string();
    for table in fragment.select(&table_sel) {
        let md = table_to_markdown(&table);
        result = result.replacen(&table.html(), &md, 1);
    }
    result
}

fn table_to_markdown(table: &ElementRef) -> String {
    let (Ok(tr), Ok(cell)) = (Selector::parse("tr"), Selector::parse("th, td")) else {
        return String::new();
    };

    let mut rows: Vec<Vec<String>> = table
        .select(&tr)
        .map(|row| {
            row.select(&cell)
                .map(|c| c.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if cols == 0 {
        return String::new();
    }
    for row in &mut rows {
        row.resize(cols, String::new());
    }

    let line = |cells: &[String]| format!("| {} |\n", cells.join(" | "));
    let mut md = String::from("\n\n");
    md.push_str(&line(&rows[0]));
    md.push_str(&line(&vec!["---".to_string(); cols]));
    for row in &rows[1..] {
        md.push_str(&line(row));
    }
    md.push('\n');
    md
}
