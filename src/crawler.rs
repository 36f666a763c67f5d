// src/crawler.rs
//! Crawl orchestrator.
//!
//! Per project: Twitter feed, then blog feed, then one import of everything
//! that survived. A failing feed counts as an empty feed; it never stops the
//! other feed of the project or the other projects.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::ingest::types::SourceKind;
use crate::pipeline::EntryPipeline;
use crate::projects::Project;
use crate::sink::ImportSink;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectReport {
    pub project_id: i64,
    pub name: String,
    /// Feeds actually fetched (a project without a URL for a source skips it).
    pub feeds: usize,
    pub records: usize,
    pub inserted: usize,
    pub ignored: usize,
    pub rejected: usize,
    pub failed_entries: usize,
    /// Whether `import_batch` was called for this project.
    pub imported: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub projects: Vec<ProjectReport>,
}

impl RunReport {
    pub fn inserted(&self) -> usize {
        self.projects.iter().map(|p| p.inserted).sum()
    }

    pub fn errors(&self) -> usize {
        self.projects.iter().map(|p| p.errors.len()).sum()
    }
}

pub struct Crawler {
    pipeline: EntryPipeline,
    sink: Arc<dyn ImportSink>,
    concurrency: usize,
}

impl Crawler {
    pub fn new(pipeline: EntryPipeline, sink: Arc<dyn ImportSink>) -> Self {
        Self {
            pipeline,
            sink,
            concurrency: 1,
        }
    }

    /// How many projects may be crawled at once. 1 keeps the run strictly sequential.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Crawl every project. Reports come back in project order.
    pub async fn run(&self, projects: &[Project]) -> RunReport {
        info!(
            target: "crawler",
            projects = projects.len(),
            concurrency = self.concurrency,
            "crawl run started"
        );

        let reports: Vec<ProjectReport> = stream::iter(projects)
            .map(|p| self.crawl_project(p))
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = RunReport { projects: reports };
        gauge!("crawl_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        info!(
            target: "crawler",
            inserted = report.inserted(),
            errors = report.errors(),
            "crawl run finished"
        );
        report
    }

    pub async fn crawl_project(&self, project: &Project) -> ProjectReport {
        let mut report = ProjectReport {
            project_id: project.id,
            name: project.name.clone(),
            ..Default::default()
        };
        let mut batch = Vec::new();

        let feeds = [
            (SourceKind::Twitter, project.twitter_feed_url.as_deref()),
            (SourceKind::Blog, project.blog_feed_url.as_deref()),
        ];

        for (source, url) in feeds {
            let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
                debug!(
                    target: "crawler",
                    project_id = project.id,
                    %source,
                    "no feed url, skipping"
                );
                continue;
            };
            report.feeds += 1;

            match self
                .pipeline
                .run(project.id, project.use_spam_filter, source, url)
                .await
            {
                Ok(outcome) => {
                    report.rejected += outcome.rejected.len();
                    report.failed_entries += outcome.failed.len();
                    batch.extend(outcome.records);
                }
                Err(e) => {
                    error!(
                        target: "crawler",
                        project_id = project.id,
                        %source,
                        url,
                        kind = e.kind(),
                        error = %e,
                        chain = %error_chain(&e),
                        "feed failed, treating it as empty"
                    );
                    counter!("crawl_pipeline_errors_total", "kind" => e.kind()).increment(1);
                    report.errors.push(format!("{source}: {e}"));
                }
            }
        }

        report.records = batch.len();
        if batch.is_empty() {
            debug!(target: "crawler", project_id = project.id, "nothing to import");
            return report;
        }

        report.imported = true;
        match self.sink.import_batch(batch).await {
            Ok(summary) => {
                report.inserted = summary.inserted;
                report.ignored = summary.ignored;
                counter!("crawl_imported_total").increment(summary.inserted as u64);
                counter!("crawl_import_ignored_total").increment(summary.ignored as u64);
                info!(
                    target: "crawler",
                    project_id = project.id,
                    inserted = summary.inserted,
                    ignored = summary.ignored,
                    "batch imported"
                );
            }
            Err(e) => {
                error!(
                    target: "crawler",
                    project_id = project.id,
                    error = %e,
                    chain = %error_chain(&e),
                    "import failed"
                );
                counter!("crawl_import_errors_total").increment(1);
                report.errors.push(format!("import: {e}"));
            }
        }
        report
    }
}

/// `outer: inner: innermost`
pub fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut out = e.to_string();
    let mut cur = e.source();
    while let Some(inner) = cur {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        cur = inner.source();
    }
    out
}
