use std::path::Path;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Prometheus recorder whose rendering is dumped to a file after the run
/// (node-exporter textfile collector style; a batch job has no scrape endpoint).
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Write via a temp file + rename so collectors never read a half-written file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.render())
            .with_context(|| format!("writing metrics to {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("moving metrics into {}", path.display()))?;
        Ok(())
    }
}

fn describe() {
    describe_counter!("crawl_fetch_total", "Feed fetch attempts.");
    describe_counter!("crawl_entries_total", "Entries found in fetched feeds.");
    describe_counter!("crawl_rejected_total", "Entries dropped by a filter, by filter.");
    describe_counter!(
        "crawl_entry_failures_total",
        "Entries that failed to parse or classify."
    );
    describe_counter!(
        "crawl_pipeline_errors_total",
        "Feeds that failed as a whole, by error kind."
    );
    describe_counter!("crawl_imported_total", "Rows inserted by the import sink.");
    describe_counter!(
        "crawl_import_ignored_total",
        "Rows skipped by the import sink as duplicates."
    );
    describe_counter!("crawl_import_errors_total", "Failed import calls.");
    describe_counter!(
        "crawl_http_status_errors_total",
        "Feed fetches answered with a non-2xx status."
    );
    describe_histogram!("crawl_parse_ms", "Feed parse time in milliseconds.");
    describe_gauge!("crawl_last_run_ts", "Unix ts when the last crawl run finished.");
}
