//! web-parser main entry point
//!
//! This is the command-line interface for the web-parser crawler. The page
//! document goes to stdout (or `-o PATH`); logs and progress go to stderr.

use anyhow::Context;
use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use web_parser::config::{
    load_site_config_with_hash, resolve_job, OutputFormat, OutputOptions, SiteConfig,
};
use web_parser::crawler::{Coordinator, ProgressSnapshot};
use web_parser::output::{create_writer, log_statistics};
use web_parser::CrawlError;

/// web-parser: a recursive web crawler and content extractor
///
/// Fetches a seed URL, extracts the title, main content and links of each
/// page, follows links within the configured bounds and writes the pages as
/// a JSON envelope or a Markdown document.
#[derive(Parser, Debug)]
#[command(name = "web-parser")]
#[command(version)]
#[command(about = "Recursive web crawler and content extractor", long_about = None)]
struct Cli {
    /// Seed URL
    #[arg(long, value_name = "URL", required_unless_present = "config")]
    url: Option<String>,

    /// Follow links from the seed page
    #[arg(long)]
    crawl: bool,

    /// Maximum link hops from the seed (with -crawl)
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Only follow links on the seed's host
    #[arg(long)]
    same_domain: bool,

    /// Delay before each request, per worker, in milliseconds
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Number of concurrent workers
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Output document format
    #[arg(long, value_enum, default_value_t = FormatArg::Json)]
    format: FormatArg,

    /// Output file; `-` writes to stdout
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Hide the progress spinner
    #[arg(long)]
    no_progress: bool,

    /// Enable debug logging on stderr
    #[arg(long)]
    verbose: bool,

    /// Overall crawl deadline in seconds
    #[arg(long, value_name = "SECONDS")]
    deadline: Option<u64>,

    /// Maximum number of pages to fetch
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Write one JSON page per line as pages complete
    #[arg(long)]
    stream: bool,

    /// Order pages by discovery instead of completion
    #[arg(long)]
    stable_order: bool,

    /// Only follow URLs matching this regex (repeatable)
    #[arg(long, value_name = "RE", allow_hyphen_values = true)]
    include_pattern: Vec<String>,

    /// Never follow URLs matching this regex (repeatable)
    #[arg(long, value_name = "RE", allow_hyphen_values = true)]
    exclude_pattern: Vec<String>,

    /// CSS selector of the main content element
    #[arg(long, value_name = "CSS")]
    content_selector: Option<String>,

    /// CSS selector of the title element
    #[arg(long, value_name = "CSS")]
    title_selector: Option<String>,

    /// CSS selector of elements to drop before extraction (repeatable)
    #[arg(long, value_name = "CSS")]
    exclude_selector: Vec<String>,

    /// Extra request header, "Name: value" (repeatable)
    #[arg(long, value_name = "HEADER")]
    header: Vec<String>,

    /// User-Agent header value
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Honor robots.txt
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    respect_robots: Option<bool>,

    /// Retries for network errors and 5xx responses
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Render page content as Markdown instead of plain text
    #[arg(long)]
    markdown_content: bool,

    /// TOML site configuration; command-line flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Json,
    Markdown,
}

impl Cli {
    /// Flags given on the command line, as a layer over the site config file
    fn site_overrides(&self) -> anyhow::Result<SiteConfig> {
        let headers = if self.header.is_empty() {
            None
        } else {
            let mut headers = std::collections::BTreeMap::new();
            for line in &self.header {
                let (name, value) = web_parser::config::parse_header(line)?;
                headers.insert(name, value);
            }
            Some(headers)
        };

        let non_empty = |values: &[String]| (!values.is_empty()).then(|| values.to_vec());
        let markdown_content =
            self.markdown_content || self.format == FormatArg::Markdown;

        Ok(SiteConfig {
            url: self.url.clone(),
            crawl: self.crawl.then_some(true),
            max_depth: self.max_depth,
            same_domain: self.same_domain.then_some(true),
            delay: self.delay,
            timeout: self.timeout,
            workers: self.workers,
            deadline: self.deadline,
            max_pages: self.max_pages,
            retries: self.retries,
            max_redirects: None,
            max_body_bytes: None,
            include_patterns: non_empty(&self.include_pattern),
            exclude_patterns: non_empty(&self.exclude_pattern),
            content_selector: self.content_selector.clone(),
            title_selector: self.title_selector.clone(),
            exclude_selectors: non_empty(&self.exclude_selector),
            headers,
            user_agent: self.user_agent.clone(),
            respect_robots: self.respect_robots,
            markdown_content: markdown_content.then_some(true),
        })
    }

    fn output_options(&self) -> OutputOptions {
        OutputOptions {
            format: match self.format {
                FormatArg::Json => OutputFormat::Json,
                FormatArg::Markdown => OutputFormat::Markdown,
            },
            path: self.output.clone(),
            stream: self.stream,
            stable_order: self.stable_order,
        }
    }
}

/// Rewrites single-dash long flags (`-url`) to their double-dash form
///
/// Only names that are real long options are rewritten, so short flags,
/// `-` as a value and values that happen to start with a dash pass through.
fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let command = Cli::command();
    let longs: Vec<&str> = command
        .get_arguments()
        .filter_map(|arg| arg.get_long())
        .chain(["help", "version"])
        .collect();

    let mut rewritten = Vec::new();
    let mut passthrough = false;
    for (index, arg) in args.into_iter().enumerate() {
        if index == 0 || passthrough {
            rewritten.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            rewritten.push(arg);
            continue;
        }

        let is_single_dash_long = arg.len() > 2 && arg.starts_with('-') && !arg.starts_with("--");
        if is_single_dash_long {
            let name = arg[1..].split('=').next().unwrap_or("");
            if longs.contains(&name) {
                rewritten.push(format!("-{}", arg));
                continue;
            }
        }
        rewritten.push(arg);
    }
    rewritten
}

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors exit with status 2 from here
    let cli = Cli::parse_from(normalize_args(std::env::args()));

    setup_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("web-parser: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Sets up the logging/tracing subscriber on stderr
///
/// `RUST_LOG` takes precedence over `-verbose`.
fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("web_parser=debug,info")
        } else {
            EnvFilter::new("web_parser=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the crawl: configuration, writer, progress and the run itself
async fn run(cli: Cli) -> anyhow::Result<()> {
    let file_config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (site, hash) = load_site_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            site
        }
        None => SiteConfig::default(),
    };

    let job = resolve_job(file_config.merge(cli.site_overrides()?))?;
    let output_options = cli.output_options();
    if output_options.stream && output_options.format == OutputFormat::Markdown {
        tracing::warn!("-stream only applies to JSON output; writing a single Markdown document");
    }

    let seed = job.seed.to_string();
    let coordinator = Coordinator::new(job)?;
    let mut writer = create_writer(&output_options).context("failed to open output")?;

    let show_progress = !cli.no_progress && std::io::stderr().is_terminal();
    let progress = show_progress.then(|| spawn_progress(coordinator.watch_progress()));

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler; never cancel
            std::future::pending::<()>().await;
        }
    };

    let report = coordinator.run(writer.as_mut(), shutdown).await?;

    if let Some((bar, task)) = progress {
        task.abort();
        bar.finish_and_clear();
    }

    log_statistics(&report.stats);

    if report.seed_unreachable() {
        return Err(CrawlError::SeedUnreachable {
            url: seed,
            reason: report.seed_failure.unwrap_or_default(),
        }
        .into());
    }

    Ok(())
}

/// Starts a stderr spinner fed from the coordinator's progress channel
fn spawn_progress(
    mut progress_rx: tokio::sync::watch::Receiver<ProgressSnapshot>,
) -> (ProgressBar, tokio::task::JoinHandle<()>) {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(120));

    let bar_clone = bar.clone();
    let task = tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let snapshot = *progress_rx.borrow();
            bar_clone.set_message(format!(
                "Crawled: {} | Failed: {} | Skipped: {} | Queued: {} | In flight: {}",
                snapshot.successful,
                snapshot.failed,
                snapshot.skipped,
                snapshot.queued,
                snapshot.in_flight
            ));
        }
    });

    (bar, task)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_single_dash_flags_rewritten() {
        let rewritten = normalize_args(args(&[
            "web-parser",
            "-url",
            "https://example.com/",
            "-crawl",
            "-max-depth",
            "2",
            "-format",
            "json",
        ]));
        assert_eq!(
            rewritten,
            args(&[
                "web-parser",
                "--url",
                "https://example.com/",
                "--crawl",
                "--max-depth",
                "2",
                "--format",
                "json",
            ])
        );
    }

    #[test]
    fn test_short_flags_and_values_untouched() {
        let rewritten = normalize_args(args(&[
            "web-parser",
            "--url=https://example.com/",
            "-o",
            "-",
            "-exclude-pattern",
            "-draft$",
            "-max-depth=3",
        ]));
        assert_eq!(
            rewritten,
            args(&[
                "web-parser",
                "--url=https://example.com/",
                "-o",
                "-",
                "--exclude-pattern",
                "-draft$",
                "--max-depth=3",
            ])
        );

        let cli = Cli::try_parse_from(rewritten).unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://example.com/"));
        assert_eq!(cli.output, Some(PathBuf::from("-")));
        assert_eq!(cli.exclude_pattern, vec!["-draft$"]);
        assert_eq!(cli.max_depth, Some(3));
    }

    #[test]
    fn test_pattern_values_may_start_with_dash() {
        let cli = Cli::try_parse_from(normalize_args(args(&[
            "web-parser",
            "-url",
            "https://example.com/",
            "-include-pattern",
            "-v2/",
            "-exclude-pattern",
            "-old$",
            "-crawl",
        ])))
        .unwrap();

        assert_eq!(cli.include_pattern, vec!["-v2/"]);
        assert_eq!(cli.exclude_pattern, vec!["-old$"]);
        assert!(cli.crawl);
    }

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::parse_from(normalize_args(args(&[
            "web-parser",
            "-url",
            "https://example.com/",
            "-crawl",
            "-max-depth",
            "3",
            "-same-domain",
            "-workers",
            "8",
            "-format",
            "markdown",
            "-o",
            "out.md",
            "-no-progress",
            "-respect-robots",
            "false",
            "-header",
            "X-Token: abc",
            "-include-pattern",
            "/docs/",
            "-include-pattern",
            "/blog/",
        ])));

        assert_eq!(cli.url.as_deref(), Some("https://example.com/"));
        assert!(cli.crawl);
        assert_eq!(cli.max_depth, Some(3));
        assert!(cli.same_domain);
        assert_eq!(cli.workers, Some(8));
        assert_eq!(cli.format, FormatArg::Markdown);
        assert_eq!(cli.output, Some(PathBuf::from("out.md")));
        assert!(cli.no_progress);
        assert_eq!(cli.respect_robots, Some(false));
        assert_eq!(cli.include_pattern, vec!["/docs/", "/blog/"]);

        let site = cli.site_overrides().unwrap();
        assert_eq!(site.crawl, Some(true));
        assert_eq!(site.markdown_content, Some(true));
        assert_eq!(
            site.headers.unwrap().get("X-Token").map(String::as_str),
            Some("abc")
        );
    }

    #[test]
    fn test_unset_flags_do_not_override_file() {
        let cli = Cli::parse_from(args(&["web-parser", "--url", "https://example.com/"]));
        let site = cli.site_overrides().unwrap();

        assert_eq!(site.crawl, None);
        assert_eq!(site.same_domain, None);
        assert_eq!(site.include_patterns, None);
        assert_eq!(site.headers, None);
        assert_eq!(site.markdown_content, None);
    }

    #[test]
    fn test_usage_error() {
        let result = Cli::try_parse_from(args(&["web-parser", "--workers", "many"]));
        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
