// src/lib.rs
//! Feed crawler library: fetch project feeds, drop noise, score sentiment,
//! import deduplicated feedback rows.

pub mod analyze;
pub mod config;
pub mod crawler;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod projects;
pub mod sink;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::crawler::{Crawler, ProjectReport, RunReport};
pub use crate::error::{ClassificationError, FetchError, ParseError, PipelineError, SinkError};
pub use crate::ingest::types::{Entry, FeedbackRecord, SourceKind};
pub use crate::pipeline::{EntryPipeline, FailurePolicy, FeedOutcome};
pub use crate::projects::{Project, ProjectCatalog, ProjectSource};
pub use crate::sink::{ImportSink, ImportSummary, MemorySink, SqliteSink};
