//! Classification gateway: language detection, sentiment scoring and spam
//! classification as three independent, injectable capabilities.
//!
//! Every call goes through a per-call timeout; expiry is reported as a
//! `ClassificationError::Timeout`, never as a hang.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ClassificationError;

/// Sentiment verdict for one piece of content.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentiment {
    /// Signed score; sign and magnitude are owned by the classifier.
    pub polarity: f32,
    /// What gets persisted in place of the raw content.
    pub description: String,
}

#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// ISO 639-1 code such as `"en"` or `"fr"`.
    async fn detect(&self, text: &str) -> Result<String, ClassificationError>;
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Sentiment, ClassificationError>;
}

#[async_trait]
pub trait SpamClassifier: Send + Sync {
    async fn is_spam(&self, text: &str) -> Result<bool, ClassificationError>;
}

pub const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared handle over the three classifiers. Cheap to clone.
#[derive(Clone)]
pub struct ClassificationGateway {
    language: Arc<dyn LanguageDetector>,
    sentiment: Arc<dyn SentimentClassifier>,
    spam: Arc<dyn SpamClassifier>,
    timeout: Duration,
}

impl ClassificationGateway {
    pub fn new(
        language: Arc<dyn LanguageDetector>,
        sentiment: Arc<dyn SentimentClassifier>,
        spam: Arc<dyn SpamClassifier>,
    ) -> Self {
        Self {
            language,
            sentiment,
            spam,
            timeout: DEFAULT_CLASSIFY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn detect_language(&self, text: &str) -> Result<String, ClassificationError> {
        bounded("language detector", self.timeout, self.language.detect(text)).await
    }

    pub async fn classify_sentiment(&self, text: &str) -> Result<Sentiment, ClassificationError> {
        bounded(
            "sentiment classifier",
            self.timeout,
            self.sentiment.classify(text),
        )
        .await
    }

    pub async fn is_spam(&self, text: &str) -> Result<bool, ClassificationError> {
        bounded("spam classifier", self.timeout, self.spam.is_spam(text)).await
    }
}

async fn bounded<T, F>(
    service: &'static str,
    timeout: Duration,
    fut: F,
) -> Result<T, ClassificationError>
where
    F: Future<Output = Result<T, ClassificationError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(res) => res,
        Err(_) => Err(ClassificationError::Timeout { service, timeout }),
    }
}
