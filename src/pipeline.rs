// src/pipeline.rs
//! Entry pipeline: one feed fetch for one (project, source kind, url).
//!
//! fetch -> parse -> per entry: filter chain -> sentiment -> `FeedbackRecord`.
//!
//! The call as a whole fails only when the document can't be fetched or read.
//! What happens on an entry-level failure (a malformed entry, a classifier
//! error) is decided by `FailurePolicy`.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analyze::filters::{FilterChain, FilterContext, FilterRules, Rejection};
use crate::analyze::gateway::ClassificationGateway;
use crate::error::{FetchError, PipelineError};
use crate::ingest::atom::parse_feed;
use crate::ingest::fetch::DocumentFetcher;
use crate::ingest::types::{ClassifiedEntry, Entry, FeedbackRecord, SourceKind};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Skip the failing entry, keep going with its siblings.
    #[default]
    PerEntry,
    /// Stop at the first failing entry; records built before it are kept.
    PerFeed,
}

#[derive(Debug)]
pub struct EntryFailure {
    /// Position of the entry in the feed document.
    pub index: usize,
    pub error: PipelineError,
}

/// What one successful pipeline call produced.
#[derive(Debug, Default)]
pub struct FeedOutcome {
    pub records: Vec<FeedbackRecord>,
    pub rejected: Vec<Rejection>,
    pub failed: Vec<EntryFailure>,
    /// Set when `FailurePolicy::PerFeed` cut the feed short.
    pub aborted: bool,
}

enum Verdict {
    Kept(FeedbackRecord),
    Rejected(Rejection),
}

pub struct EntryPipeline {
    fetcher: Arc<dyn DocumentFetcher>,
    gateway: ClassificationGateway,
    filters: FilterChain,
    fetch_timeout: Duration,
    policy: FailurePolicy,
}

impl EntryPipeline {
    /// Pipeline with the standard filter order.
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        gateway: ClassificationGateway,
        rules: &FilterRules,
    ) -> Self {
        let filters = FilterChain::standard(&gateway, rules);
        Self {
            fetcher,
            gateway,
            filters,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    pub async fn run(
        &self,
        project_id: i64,
        use_spam_filter: bool,
        source: SourceKind,
        url: &str,
    ) -> Result<FeedOutcome, PipelineError> {
        info!(target: "crawler", project_id, %source, url, "fetching feed");
        counter!("crawl_fetch_total").increment(1);

        let raw = self.fetch(url).await?;
        let parsed = parse_feed(&raw)?;

        let ctx = FilterContext {
            use_spam_filter,
            source,
        };
        let mut outcome = FeedOutcome::default();

        for (index, item) in parsed.into_iter().enumerate() {
            let verdict = match item {
                Ok(entry) => self.process_entry(project_id, &ctx, entry).await,
                Err(e) => Err(e.into()),
            };

            match verdict {
                Ok(Verdict::Kept(record)) => outcome.records.push(record),
                Ok(Verdict::Rejected(rejection)) => {
                    counter!("crawl_rejected_total", "filter" => rejection.filter).increment(1);
                    outcome.rejected.push(rejection);
                }
                Err(error) => {
                    warn!(
                        target: "crawler",
                        project_id, %source, index,
                        kind = error.kind(),
                        error = %error,
                        "entry failed"
                    );
                    counter!("crawl_entry_failures_total", "kind" => error.kind()).increment(1);
                    outcome.failed.push(EntryFailure { index, error });
                    if self.policy == FailurePolicy::PerFeed {
                        outcome.aborted = true;
                        break;
                    }
                }
            }
        }

        Ok(outcome)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(url)).await {
            Ok(res) => res,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout: self.fetch_timeout,
            }),
        }
    }

    async fn process_entry(
        &self,
        project_id: i64,
        ctx: &FilterContext,
        entry: Entry,
    ) -> Result<Verdict, PipelineError> {
        if let Some(rejection) = self.filters.evaluate(&entry, ctx).await? {
            info!(
                target: "crawler",
                project_id,
                source = %ctx.source,
                reason = %rejection.reason,
                title = %entry.title,
                "entry rejected"
            );
            return Ok(Verdict::Rejected(rejection));
        }

        let sentiment = self.gateway.classify_sentiment(&entry.content).await?;
        let classified = ClassifiedEntry {
            entry,
            polarity: sentiment.polarity,
            description: sentiment.description,
        };
        Ok(Verdict::Kept(FeedbackRecord::new(
            project_id, ctx.source, classified,
        )))
    }
}
