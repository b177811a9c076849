//! Application configuration for webdigest.
//!
//! User config lives at `~/.webdigest/webdigest.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WebdigestError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "webdigest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".webdigest";

// ---------------------------------------------------------------------------
// Config structs (matching webdigest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Language-model endpoint settings.
    #[serde(default)]
    pub llm: LlmSection,

    /// Crawl behaviour.
    #[serde(default)]
    pub crawl: CrawlSection,

    /// PDF page setup.
    #[serde(default)]
    pub pdf: PdfSection,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default PDF output path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Default maximum crawl depth (0 = only the seed page).
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_output() -> String {
    "outputs/document.pdf".into()
}
fn default_max_depth() -> u32 {
    1
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    /// Chat-completions endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.deepseek.com/v1/chat/completions".into()
}
fn default_model() -> String {
    "deepseek-reasoner".into()
}
fn default_api_key_env() -> String {
    "DEEPSEEK_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// Which URL relative links are resolved against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkBase {
    /// Resolve every discovered link against the seed URL.
    #[default]
    Seed,
    /// Resolve each link against the page it was found on.
    Page,
}

impl std::str::FromStr for LinkBase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "seed" => Ok(Self::Seed),
            "page" => Ok(Self::Page),
            other => Err(format!("unknown link base '{other}': expected 'seed' or 'page'")),
        }
    }
}

impl std::fmt::Display for LinkBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seed => f.write_str("seed"),
            Self::Page => f.write_str("page"),
        }
    }
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSection {
    /// Per-page fetch timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Base used to resolve relative links.
    #[serde(default)]
    pub link_base: LinkBase,

    /// Only follow links on the seed's host.
    #[serde(default)]
    pub same_host_only: bool,

    /// URL path glob patterns that are never followed.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl Default for CrawlSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            link_base: LinkBase::default(),
            same_host_only: false,
            exclude_patterns: Vec::new(),
        }
    }
}

/// `[pdf]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfSection {
    #[serde(default = "default_page_width")]
    pub page_width_mm: f32,

    #[serde(default = "default_page_height")]
    pub page_height_mm: f32,

    /// Margin applied to all four sides.
    #[serde(default = "default_margin")]
    pub margin_mm: f32,

    /// Body text size in points.
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Optional TrueType font to embed instead of the built-in PDF fonts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,
}

impl Default for PdfSection {
    fn default() -> Self {
        Self {
            page_width_mm: default_page_width(),
            page_height_mm: default_page_height(),
            margin_mm: default_margin(),
            font_size: default_font_size(),
            font_path: None,
        }
    }
}

// A4
fn default_page_width() -> f32 {
    210.0
}
fn default_page_height() -> f32 {
    297.0
}
fn default_margin() -> f32 {
    15.0
}
fn default_font_size() -> f32 {
    11.0
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime crawl configuration, merged from config file and CLI flags.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum depth from the seed URL.
    pub max_depth: u32,
    /// Per-page fetch timeout in seconds.
    pub timeout_secs: u64,
    /// Base used to resolve relative links.
    pub link_base: LinkBase,
    /// Only follow links on the seed's host.
    pub same_host_only: bool,
    /// URL path glob patterns that are never followed.
    pub exclude_patterns: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_depth: config.defaults.max_depth,
            timeout_secs: config.crawl.timeout_secs,
            link_base: config.crawl.link_base,
            same_host_only: config.crawl.same_host_only,
            exclude_patterns: config.crawl.exclude_patterns.clone(),
        }
    }
}

/// Runtime language-model configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl From<&AppConfig> for LlmConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            endpoint: config.llm.endpoint.clone(),
            model: config.llm.model.clone(),
            timeout_secs: config.llm.timeout_secs,
        }
    }
}

/// Runtime PDF page setup.
#[derive(Debug, Clone)]
pub struct PdfConfig {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub font_size: f32,
    pub font_path: Option<PathBuf>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PdfConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_width_mm: config.pdf.page_width_mm,
            page_height_mm: config.pdf.page_height_mm,
            margin_mm: config.pdf.margin_mm,
            font_size: config.pdf.font_size,
            font_path: config.pdf.font_path.as_ref().map(PathBuf::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

impl AppConfig {
    /// `~/.webdigest/webdigest.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| WebdigestError::config("could not determine home directory"))
    }

    /// Read settings from `path`, or from [`AppConfig::default_path`] when `None`.
    ///
    /// A missing file at the default location yields the built-in defaults;
    /// an explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path()?, false),
        };

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(WebdigestError::io(&path, e)),
        };

        toml::from_str(&text)
            .map_err(|e| WebdigestError::config(format!("{}: {e}", path.display())))
    }

    /// Write these settings to `path` as TOML, creating missing parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| WebdigestError::io(dir, e))?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| WebdigestError::config(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| WebdigestError::io(path, e))?;

        tracing::info!(path = %path.display(), "config written");
        Ok(())
    }
}

impl LlmSection {
    /// The API key, read from the environment variable named by `api_key_env`.
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                WebdigestError::config(format!(
                    "API key not found. Set the {} environment variable.",
                    self.api_key_env
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("outputs/document.pdf"));
        assert!(toml_str.contains("DEEPSEEK_API_KEY"));
        assert!(toml_str.contains("link_base = \"seed\""));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let toml_str = r#"
[defaults]
max_depth = 3

[crawl]
link_base = "page"
exclude_patterns = ["/blog/**"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.max_depth, 3);
        assert_eq!(config.defaults.output, "outputs/document.pdf");
        assert_eq!(config.crawl.link_base, LinkBase::Page);
        assert_eq!(config.crawl.timeout_secs, 30);
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.pdf.margin_mm, 15.0);
        assert!(config.pdf.font_path.is_none());
    }

    #[test]
    fn runtime_configs_from_app_config() {
        let app = AppConfig::default();

        let crawl = CrawlConfig::from(&app);
        assert_eq!(crawl.max_depth, 1);
        assert_eq!(crawl.link_base, LinkBase::Seed);
        assert!(!crawl.same_host_only);

        let llm = LlmConfig::from(&app);
        assert_eq!(llm.endpoint, "https://api.deepseek.com/v1/chat/completions");
        assert_eq!(llm.timeout_secs, 30);

        let pdf = PdfConfig::from(&app);
        assert_eq!(pdf.page_width_mm, 210.0);
        assert_eq!(pdf.page_height_mm, 297.0);
    }

    #[test]
    fn link_base_parses_case_insensitively() {
        assert_eq!("Seed".parse::<LinkBase>(), Ok(LinkBase::Seed));
        assert_eq!("page".parse::<LinkBase>(), Ok(LinkBase::Page));
        assert!("sibling".parse::<LinkBase>().is_err());
    }

    #[test]
    fn missing_api_key_names_the_variable() {
        let mut config = AppConfig::default();
        // Unique name so no other test or shell sets it
        config.llm.api_key_env = "WD_TEST_NONEXISTENT_KEY_12345".into();
        let err = config.llm.api_key().unwrap_err();
        assert!(err.to_string().contains("WD_TEST_NONEXISTENT_KEY_12345"));
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("webdigest-config-{}", uuid::Uuid::now_v7()))
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = temp_dir();
        let path = dir.join("nested/webdigest.toml");

        let mut config = AppConfig::default();
        config.defaults.max_depth = 4;
        config.crawl.link_base = LinkBase::Page;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.defaults.max_depth, 4);
        assert_eq!(loaded.crawl.link_base, LinkBase::Page);
        assert_eq!(loaded.llm.model, config.llm.model);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let path = temp_dir().join("absent.toml");
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, WebdigestError::Io { .. }));
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let dir = temp_dir();
        let path = dir.join("broken.toml");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "[defaults\nmax_depth = ").unwrap();

        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, WebdigestError::Config { .. }));
        assert!(err.to_string().contains("broken.toml"));
        let _ = std::fs::remove_dir_all(dir);
    }
}
