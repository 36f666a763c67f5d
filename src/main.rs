//! Feedback crawler binary.
//! One run crawls the selected projects once and exits; scheduling is cron's job.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedback_crawler::config::CrawlerConfig;
use feedback_crawler::ingest::fetch::HttpFetcher;
use feedback_crawler::projects::{select_projects, ProjectCatalog};
use feedback_crawler::telemetry::Metrics;
use feedback_crawler::{Crawler, EntryPipeline, SqliteSink};

#[derive(Debug, Parser)]
#[command(name = "feedback-crawler", version, about)]
struct Cli {
    /// Project names to crawl. No names means every project.
    projects: Vec<String>,

    /// Config file (TOML or JSON).
    /// Defaults to $CRAWLER_CONFIG_PATH, then config/crawler.{toml,json}.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `projects_path` from the config.
    #[arg(long)]
    projects_file: Option<PathBuf>,

    /// Override `database_path` from the config.
    #[arg(long)]
    database: Option<PathBuf>,

    /// Override `concurrency` from the config.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Drop unknown project names instead of refusing to run.
    #[arg(long)]
    skip_unknown: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json: bool,

    /// Write Prometheus text-format metrics here after the run.
    #[arg(long)]
    metrics_file: Option<PathBuf>,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crawler=info,warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.json);

    let metrics = cli.metrics_file.as_ref().map(|_| Metrics::init()).transpose()?;

    let mut cfg = match &cli.config {
        Some(p) => CrawlerConfig::load_from(p)?,
        None => CrawlerConfig::load_default()?,
    };
    if let Some(p) = cli.projects_file {
        cfg.projects_path = p;
    }
    if let Some(p) = cli.database {
        cfg.database_path = p;
    }
    if let Some(n) = cli.concurrency {
        cfg.concurrency = n.max(1);
    }

    let catalog = ProjectCatalog::load_from(&cfg.projects_path)?;
    let projects = select_projects(&catalog, &cli.projects, cli.skip_unknown)
        .await
        .context("selecting projects")?;

    let fetcher = HttpFetcher::new(&cfg.user_agent, cfg.fetch_timeout())
        .context("building http client")?;
    let pipeline = EntryPipeline::new(Arc::new(fetcher), cfg.local_gateway(), &cfg.filter_rules()?)
        .with_fetch_timeout(cfg.fetch_timeout())
        .with_failure_policy(cfg.failure_policy);
    let sink = SqliteSink::open(&cfg.database_path).context("opening import database")?;

    let report = Crawler::new(pipeline, Arc::new(sink))
        .with_concurrency(cfg.concurrency)
        .run(&projects)
        .await;

    for p in &report.projects {
        info!(
            target: "crawler",
            project = %p.name,
            feeds = p.feeds,
            inserted = p.inserted,
            ignored = p.ignored,
            rejected = p.rejected,
            failed_entries = p.failed_entries,
            errors = p.errors.len(),
            "project summary"
        );
    }

    if let (Some(m), Some(path)) = (metrics, cli.metrics_file.as_deref()) {
        m.write_to(path)?;
    }
    Ok(())
}
