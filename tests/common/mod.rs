// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use feedback_crawler::analyze::gateway::{
    ClassificationGateway, LanguageDetector, Sentiment, SentimentClassifier, SpamClassifier,
};
use feedback_crawler::analyze::{LexiconClassifier, StopwordDetector};
use feedback_crawler::ingest::fetch::DocumentFetcher;
use feedback_crawler::{ClassificationError, FetchError};

pub const ENGLISH: &str = "This is the best release and it works with my code";
pub const FRENCH: &str = "Je pense que la nouvelle version est vraiment pour les pros";

/// Scripted fetcher: url -> body, HTTP status failure, or never-answering request.
#[derive(Default)]
pub struct StaticFetcher {
    docs: HashMap<String, Doc>,
    pub fetched: Mutex<Vec<String>>,
}

#[derive(Clone)]
enum Doc {
    Body(String),
    Status(u16),
    Hang,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: impl Into<String>) -> Self {
        self.docs.insert(url.to_string(), Doc::Body(body.into()));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.docs.insert(url.to_string(), Doc::Status(status));
        self
    }

    pub fn with_hang(mut self, url: &str) -> Self {
        self.docs.insert(url.to_string(), Doc::Hang);
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        match self.docs.get(url).cloned() {
            Some(Doc::Body(b)) => Ok(b.into_bytes()),
            Some(Doc::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Some(Doc::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Real local classifiers behind call counters.
/// Content containing `SPAM` is spam; content containing `EXPLODE` breaks the sentiment service.
#[derive(Default)]
pub struct SpyClassifiers {
    pub language_calls: AtomicUsize,
    pub spam_calls: AtomicUsize,
    pub sentiment_calls: AtomicUsize,
    pub sentiment_inputs: Mutex<Vec<String>>,
}

impl SpyClassifiers {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn language_calls(&self) -> usize {
        self.language_calls.load(Ordering::SeqCst)
    }
    pub fn spam_calls(&self) -> usize {
        self.spam_calls.load(Ordering::SeqCst)
    }
    pub fn sentiment_calls(&self) -> usize {
        self.sentiment_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageDetector for SpyClassifiers {
    async fn detect(&self, text: &str) -> Result<String, ClassificationError> {
        self.language_calls.fetch_add(1, Ordering::SeqCst);
        StopwordDetector::default().detect(text).await
    }
}

#[async_trait]
impl SpamClassifier for SpyClassifiers {
    async fn is_spam(&self, text: &str) -> Result<bool, ClassificationError> {
        self.spam_calls.fetch_add(1, Ordering::SeqCst);
        Ok(text.contains("SPAM"))
    }
}

#[async_trait]
impl SentimentClassifier for SpyClassifiers {
    async fn classify(&self, text: &str) -> Result<Sentiment, ClassificationError> {
        self.sentiment_calls.fetch_add(1, Ordering::SeqCst);
        self.sentiment_inputs.lock().unwrap().push(text.to_string());
        if text.contains("EXPLODE") {
            return Err(ClassificationError::Unavailable {
                service: "sentiment classifier",
                message: "connection refused".into(),
            });
        }
        LexiconClassifier::new().classify(text).await
    }
}

pub fn gateway(spy: &Arc<SpyClassifiers>) -> ClassificationGateway {
    ClassificationGateway::new(spy.clone(), spy.clone(), spy.clone())
}

/// One Atom `<entry>`.
pub fn entry(title: &str, content: &str, link: &str, author: &str) -> String {
    format!(
        r#"  <entry>
    <id>{link}</id>
    <published>2009-03-01T12:00:00Z</published>
    <link type="text/html" rel="alternate" href="{link}"/>
    <title>{title}</title>
    <content type="html">{content}</content>
    <link type="image/png" rel="image" href="http://img.example.com/avatar.png"/>
    <author>
      <name>{author}</name>
      <uri>http://example.com/people/1</uri>
    </author>
  </entry>
"#
    )
}

pub fn feed(entries: &[String]) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<feed xmlns=\"http://www.w3.org/2005/Atom\">\n",
            "  <title>test feed</title>\n{}</feed>\n",
        ),
        entries.concat()
    )
}
