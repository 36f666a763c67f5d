// src/error.rs
//! Error kinds raised inside one pipeline invocation (one project, one source kind).
//!
//! Filter rejections are not errors and never show up here.

use std::time::Duration;

use thiserror::Error;

/// Failure reaching a feed URL.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("http request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("fetching {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}

/// Malformed document, or a required entry sub-field is missing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed feed document: {0}")]
    Document(String),

    #[error("entry #{index}: missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("entry #{index}: unparseable timestamp {value:?}")]
    InvalidTimestamp { index: usize, value: String },
}

/// Language, sentiment or spam service unavailable or answered garbage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("{service} unavailable: {message}")]
    Unavailable {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned a malformed response: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },

    #[error("{service} timed out after {timeout:?}")]
    Timeout {
        service: &'static str,
        timeout: Duration,
    },
}

/// Everything one `EntryPipeline::run` call can fail with.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

impl PipelineError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) => "fetch",
            PipelineError::Parse(_) => "parse",
            PipelineError::Classification(_) => "classification",
        }
    }
}

/// Import sink failures. Duplicate keys are not reported here.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("sink worker stopped: {0}")]
    Worker(String),
}
