//! Post-conversion cleanup passes for extracted Markdown.
//!
//! Passes run in order; each takes the whole document and returns a new one.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

/// Passes that need no context beyond the text itself.
const TEXT_PASSES: [fn(&str) -> String; 5] = [
    demote_extra_h1,
    strip_layout_tags,
    images_to_alt_text,
    fix_fence_languages,
    collapse_blank_lines,
];

/// Run every cleanup pass over raw `htmd` output.
pub(crate) fn run_pipeline(md: &str, base_url: Option<&Url>) -> String {
    let mut text = TEXT_PASSES
        .iter()
        .fold(md.to_string(), |acc, pass| pass(&acc));

    if let Some(base) = base_url {
        text = resolve_relative_links(&text, base);
    }

    let trimmed: Vec<&str> = text.lines().map(str::trim_end).collect();
    format!("{}\n", trimmed.join("\n").trim_matches('\n'))
}

/// Only the first H1 stays an H1; later ones become H2.
fn demote_extra_h1(md: &str) -> String {
    let mut seen_h1 = false;
    md.lines()
        .map(|line| match line.strip_prefix("# ") {
            Some(rest) if seen_h1 => format!("## {rest}"),
            Some(_) => {
                seen_h1 = true;
                line.to_string()
            }
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove layout-only tags that survived conversion, outside code fences.
fn strip_layout_tags(md: &str) -> String {
    static LAYOUT_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"</?(?:div|span|section|article|aside|header|footer|figure|figcaption|details|summary)(?:\s[^>]*)?>",
        )
        .expect("valid regex")
    });

    let mut in_fence = false;
    md.lines()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                return line.to_string();
            }
            if in_fence {
                line.to_string()
            } else {
                LAYOUT_TAG_RE.replace_all(line, "").into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `![alt](src)` carries nothing useful for a text model; keep the alt text.
fn images_to_alt_text(md: &str) -> String {
    static IMAGE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("valid regex"));

    IMAGE_RE.replace_all(md, "$1").into_owned()
}

/// ```` ```language-js ```` → ```` ```js ````
fn fix_fence_languages(md: &str) -> String {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^```(?:language-|lang-|highlight-)(\w+)").expect("valid regex")
    });

    FENCE_RE.replace_all(md, "```$1").into_owned()
}

/// Runs of more than one blank line become a single blank line.
fn collapse_blank_lines(md: &str) -> String {
    static BLANKS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*){2,}").expect("valid regex"));

    BLANKS_RE.replace_all(md, "\n\n").into_owned()
}

/// Resolve relative `[text](href)` targets against the page URL.
fn resolve_relative_links(md: &str, base: &Url) -> String {
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

    LINK_RE
        .replace_all(md, |caps: &Captures| {
            let href = &caps[2];
            let absolute = href.contains("://")
                || href.starts_with('#')
                || href.starts_with("mailto:")
                || href.starts_with("tel:");
            if absolute {
                return caps[0].to_string();
            }
            match base.join(href) {
                Ok(resolved) => format!("[{}]({resolved})", &caps[1]),
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demotes_duplicate_h1() {
        let input = "# Title\n\nSome text\n\n# Another Title\n\nMore text";
        assert_eq!(
            demote_extra_h1(input),
            "# Title\n\nSome text\n\n## Another Title\n\nMore text"
        );
    }

    #[test]
    fn keeps_heading_hierarchy() {
        let input = "# Only One\n\n## Sub\n\n### Deep";
        assert_eq!(demote_extra_h1(input), input);
    }

    #[test]
    fn collapses_blank_runs() {
        assert_eq!(collapse_blank_lines("Line 1\n\n\n\n\nLine 2"), "Line 1\n\nLine 2");
        assert_eq!(collapse_blank_lines("Line 1\n\nLine 2"), "Line 1\n\nLine 2");
    }

    #[test]
    fn strips_fence_language_prefix() {
        let input = "```language-javascript\nconsole.log('hi');\n```";
        assert!(fix_fence_languages(input).starts_with("```javascript"));
    }

    #[test]
    fn layout_tags_removed_outside_fences_only() {
        let input = "<div class=\"note\">Important</div>\n\n```html\n<div>Kept</div>\n```";
        let result = strip_layout_tags(input);
        assert!(result.starts_with("Important"));
        assert!(result.contains("<div>Kept</div>"));
    }

    #[test]
    fn images_become_alt_text() {
        assert_eq!(
            images_to_alt_text("Before ![A diagram](/img/d.png) after"),
            "Before A diagram after"
        );
    }

    #[test]
    fn relative_links_resolved_absolute_untouched() {
        let base = Url::parse("https://docs.example.com/guide/intro").unwrap();
        assert_eq!(
            resolve_relative_links("[Next](/api/reference)", &base),
            "[Next](https://docs.example.com/api/reference)"
        );
        assert_eq!(
            resolve_relative_links("[Other](https://other.com/page)", &base),
            "[Other](https://other.com/page)"
        );
        assert_eq!(
            resolve_relative_links("[Section](#s1)", &base),
            "[Section](#s1)"
        );
    }

    #[test]
    fn full_pipeline_cleans_markdown() {
        let input = "# Title   \n\n\n\n\n\n## Section\n\n<div>Some content</div>\n\n```language-python\nprint('hi')\n```\n\n\nEnd\n\n\n";
        let base = Url::parse("https://example.com/page").unwrap();
        let result = run_pipeline(input, Some(&base));

        assert!(result.starts_with("# Title\n"));
        assert!(!result.contains("\n\n\n"));
        assert!(result.contains("```python"));
        assert!(!result.contains("<div>"));
        assert!(result.contains("Some content"));
        assert!(result.ends_with("End\n"));
    }
}
