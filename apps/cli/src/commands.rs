//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use webdigest_core::pipeline::{DigestConfig, DigestResult, ProgressReporter};
use webdigest_crawler::HttpFetcher;
use webdigest_llm::ChatCompletionsClient;
use webdigest_pdf::PdfRenderer;
use webdigest_shared::{AppConfig, CrawlConfig, LinkBase, LlmConfig, PdfConfig, WebdigestError};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// webdigest: crawl a website and turn it into an LLM-rewritten PDF.
#[derive(Parser)]
#[command(
    name = "webdigest",
    version,
    about = "Crawl a website, transform every page with an LLM, and render one PDF.",
    long_about = None,
    subcommand_negates_reqs = true,
    args_conflicts_with_subcommands = true,
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub digest: DigestArgs,

    /// Config file to use instead of ~/.webdigest/webdigest.toml.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config_path: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Flags for a digest run.
#[derive(Args)]
pub(crate) struct DigestArgs {
    /// Seed URL to start crawling from.
    #[arg(long, required = true)]
    pub url: Option<String>,

    /// Instruction applied to every crawled page.
    #[arg(long, required = true)]
    pub prompt: Option<String>,

    /// Output PDF path (default: outputs/document.pdf).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum link depth from the seed (default: 1).
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Model identifier sent to the chat-completions endpoint.
    #[arg(long)]
    pub model: Option<String>,

    /// Base for resolving relative links: seed or page.
    #[arg(long, value_name = "BASE")]
    pub resolve_links_against: Option<LinkBase>,

    /// Only follow links on the seed URL's host.
    #[arg(long)]
    pub same_host_only: bool,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults (to --config, if given).
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "webdigest=info",
        1 => "webdigest=debug",
        _ => "webdigest=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(cli.config_path),
            ConfigAction::Show => cmd_config_show(cli.config_path.as_deref()),
        },
        None => cmd_digest(cli.digest, cli.config_path.as_deref()).await,
    }
}

/// Apply command-line overrides on top of the loaded config.
fn apply_overrides(config: &mut AppConfig, args: &DigestArgs) {
    if let Some(max_depth) = args.max_depth {
        config.defaults.max_depth = max_depth;
    }
    if let Some(output) = &args.output {
        config.defaults.output = output.to_string_lossy().into_owned();
    }
    if let Some(model) = &args.model {
        config.llm.model = model.clone();
    }
    if let Some(link_base) = args.resolve_links_against {
        config.crawl.link_base = link_base;
    }
    if args.same_host_only {
        config.crawl.same_host_only = true;
    }
}

fn parse_seed(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| WebdigestError::invalid_url(url, e.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(WebdigestError::invalid_url(url, "only http and https URLs can be crawled").into());
    }
    Ok(parsed)
}

async fn cmd_digest(args: DigestArgs, config_path: Option<&Path>) -> Result<()> {
    let (Some(url), Some(prompt)) = (args.url.as_deref(), args.prompt.as_deref()) else {
        return Err(eyre!("both --url and --prompt are required"));
    };

    let mut config = AppConfig::load(config_path)?;
    apply_overrides(&mut config, &args);

    // Fail on a missing key before any page is fetched
    let api_key = config.llm.api_key()?;
    let seed = parse_seed(url)?;

    let crawl = CrawlConfig::from(&config);
    let fetcher = HttpFetcher::new(&crawl)?;
    let transformer = ChatCompletionsClient::new(&LlmConfig::from(&config), api_key)?;
    let renderer = PdfRenderer::new(PdfConfig::from(&config));

    let digest_config = DigestConfig {
        url: seed,
        prompt: prompt.to_string(),
        output: PathBuf::from(&config.defaults.output),
        crawl,
    };

    info!(
        url,
        max_depth = digest_config.crawl.max_depth,
        model = %transformer.model(),
        output = %digest_config.output.display(),
        "starting digest"
    );

    let reporter = CliProgress::new()?;
    let result = webdigest_core::run_digest(
        &digest_config,
        fetcher,
        &transformer,
        &renderer,
        &reporter,
    )
    .await;

    // Leave the terminal clean whether or not the run succeeded
    reporter.spinner.finish_and_clear();
    let result = result?;

    println!();
    println!("  PDF written to: {}", result.output.display());
    println!("  Pages:   {} crawled, {} transformed", result.pages_crawled, result.pages_transformed);
    if !result.failures.is_empty() {
        println!("  Skipped: {} (fetch failed)", result.failures.len());
        for failure in &result.failures {
            println!("    - {}: {}", failure.url, failure.message);
        }
    }
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { spinner })
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_fetched(&self, url: &str, fetched: usize, queued: usize) {
        self.spinner
            .set_message(format!("Fetched {fetched} ({queued} queued) {url}"));
    }

    fn page_failed(&self, url: &str, message: &str) {
        self.spinner.println(format!("  skipped {url}: {message}"));
    }

    fn page_transformed(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Transformed [{current}/{total}] {url}"));
    }

    fn done(&self, _result: &DigestResult) {
        self.spinner.finish_and_clear();
    }
}

fn cmd_config_init(config_path: Option<PathBuf>) -> Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => AppConfig::default_path()?,
    };
    AppConfig::default().save(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
