//! Which discovered links may enter the frontier.

use std::fmt;

use regex::Regex;
use url::Url;

use webdigest_shared::CrawlConfig;

/// Why a link was kept out of the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutOfScope {
    Scheme,
    Host,
    Excluded,
}

impl fmt::Display for OutOfScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scheme => "not http(s)",
            Self::Host => "different host",
            Self::Excluded => "matches an exclude pattern",
        })
    }
}

pub(crate) struct CrawlScope {
    seed_host: String,
    same_host_only: bool,
    exclude_patterns: Vec<Regex>,
}

impl CrawlScope {
    pub(crate) fn new(seed: &Url, config: &CrawlConfig) -> Self {
        Self {
            seed_host: seed.host_str().unwrap_or_default().to_string(),
            same_host_only: config.same_host_only,
            exclude_patterns: config
                .exclude_patterns
                .iter()
                .filter_map(|p| glob_to_regex(p))
                .collect(),
        }
    }

    pub(crate) fn check(&self, url: &Url) -> Result<(), OutOfScope> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(OutOfScope::Scheme);
        }
        if self.same_host_only && url.host_str().unwrap_or_default() != self.seed_host {
            return Err(OutOfScope::Host);
        }
        if self.exclude_patterns.iter().any(|p| p.is_match(url.path())) {
            return Err(OutOfScope::Excluded);
        }
        Ok(())
    }
}

/// `**` matches across segments, `*` within one segment, `?` one character.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let escaped = regex::escape(pattern)
        .replace(r"\*\*", ".*")
        .replace(r"\*", "[^/]*")
        .replace(r"\?", ".");
    Regex::new(&format!("^{escaped}$")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(same_host_only: bool, exclude: &[&str]) -> CrawlConfig {
        CrawlConfig {
            same_host_only,
            exclude_patterns: exclude.iter().map(|s| s.to_string()).collect(),
            ..CrawlConfig::default()
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn non_http_schemes_are_out_of_scope() {
        let scope = CrawlScope::new(&url("https://example.com/"), &config(false, &[]));
        assert_eq!(scope.check(&url("ftp://example.com/file")), Err(OutOfScope::Scheme));
        assert_eq!(scope.check(&url("file:///etc/hosts")), Err(OutOfScope::Scheme));
        assert_eq!(
            scope.check(&url("mailto:team@example.com")),
            Err(OutOfScope::Scheme)
        );
        assert_eq!(scope.check(&url("http://other.org/")), Ok(()));
    }

    #[test]
    fn same_host_restriction_is_opt_in() {
        let seed = url("https://docs.example.com/guide/");
        let open = CrawlScope::new(&seed, &config(false, &[]));
        let closed = CrawlScope::new(&seed, &config(true, &[]));

        let other = url("https://other.example.com/guide/intro");
        assert_eq!(open.check(&other), Ok(()));
        assert_eq!(closed.check(&other), Err(OutOfScope::Host));
        assert_eq!(closed.check(&url("https://docs.example.com/api")), Ok(()));
    }

    #[test]
    fn exclude_patterns_match_paths() {
        let scope = CrawlScope::new(
            &url("https://example.com/"),
            &config(false, &["/blog/**", "/*.pdf"]),
        );
        let blog = url("https://example.com/blog/2024/post");
        assert_eq!(scope.check(&blog), Err(OutOfScope::Excluded));
        assert_eq!(
            scope.check(&url("https://example.com/manual.pdf")),
            Err(OutOfScope::Excluded)
        );
        assert_eq!(scope.check(&url("https://example.com/docs/manual.pdf")), Ok(()));
        assert_eq!(scope.check(&url("https://example.com/guide")), Ok(()));
    }

    #[test]
    fn reasons_read_well_in_logs() {
        assert_eq!(OutOfScope::Scheme.to_string(), "not http(s)");
        assert_eq!(OutOfScope::Host.to_string(), "different host");
    }
}
