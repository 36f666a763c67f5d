// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which feed channel an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Twitter,
    Blog,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Twitter => "twitter",
            SourceKind::Blog => "blog",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed feed item. Lives for a single pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub link: String,
    pub author_image: Option<String>,
    pub author_name: String,
    pub author_url: String,
}

/// Entry plus what the sentiment classifier said about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEntry {
    pub entry: Entry,
    pub polarity: f32,
    pub description: String,
}

/// Dedup key shared with the import sink: project id followed by the link, no separator.
pub fn dedup_key(project_id: i64, link: &str) -> String {
    format!("{project_id}{link}")
}

/// One storable row. Built only from a classified entry, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRecord {
    project_id: i64,
    created_at: DateTime<Utc>,
    title: String,
    description: String,
    url: String,
    polarity: f32,
    author_image: Option<String>,
    author_name: String,
    author_url: String,
    source: SourceKind,
    dedup_key: String,
}

impl FeedbackRecord {
    pub fn new(project_id: i64, source: SourceKind, classified: ClassifiedEntry) -> Self {
        let ClassifiedEntry {
            entry,
            polarity,
            description,
        } = classified;
        Self {
            project_id,
            created_at: entry.published_at,
            title: entry.title,
            description,
            dedup_key: dedup_key(project_id, &entry.link),
            url: entry.link,
            polarity,
            author_image: entry.author_image,
            author_name: entry.author_name,
            author_url: entry.author_url,
            source,
        }
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn url(&self) -> &str {
        &self.url
    }
    pub fn polarity(&self) -> f32 {
        self.polarity
    }
    pub fn author_image(&self) -> Option<&str> {
        self.author_image.as_deref()
    }
    pub fn author_name(&self) -> &str {
        &self.author_name
    }
    pub fn author_url(&self) -> &str {
        &self.author_url
    }
    pub fn source(&self) -> SourceKind {
        self.source
    }
    pub fn dedup_key(&self) -> &str {
        &self.dedup_key
    }
}
