//! Rejection filter chain.
//!
//! Filters run in a fixed order and the first one that rejects wins:
//! language, then spam (only for projects that opt in), then the filter for
//! the fetch's source kind (URL blacklist for blogs, author blacklist for
//! Twitter). Filters hold no per-entry state; everything they need about the
//! fetch comes in through `FilterContext`.

use std::collections::HashSet;

use async_trait::async_trait;
use regex::Regex;

use crate::analyze::gateway::ClassificationGateway;
use crate::error::ClassificationError;
use crate::ingest::types::{Entry, SourceKind};

/// Only language that survives the language filter.
pub const ACCEPTED_LANGUAGE: &str = "en";

/// Host rules for blog links, in match order.
pub const DEFAULT_URL_RULES: &[&str] = &[
    r"^http://twitter\.pbwiki\.com/Apps\.",
    r"^http://github\.com/",
    r"^http://.*\.lighthouseapp\.com/projects/",
];

/// Twitter display names that are bots, not feedback.
pub const DEFAULT_AUTHOR_BLACKLIST: &[&str] = &["_snax (_snax)", "commit_log (commit_log)"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterContext {
    pub use_spam_filter: bool,
    pub source: SourceKind,
}

/// Why an entry was dropped. `reason` is the log tag: the detected language
/// code, `spam`, `urlfilter` or `authorfilter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub filter: &'static str,
    pub reason: String,
}

impl Rejection {
    fn new(filter: &'static str, reason: impl Into<String>) -> Self {
        Self {
            filter,
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait Filter: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(Some(_))` rejects the entry, `Ok(None)` passes it on.
    async fn reject(
        &self,
        entry: &Entry,
        ctx: &FilterContext,
    ) -> Result<Option<Rejection>, ClassificationError>;
}

pub struct LanguageFilter {
    gateway: ClassificationGateway,
}

impl LanguageFilter {
    pub fn new(gateway: ClassificationGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Filter for LanguageFilter {
    fn name(&self) -> &'static str {
        "language"
    }

    async fn reject(
        &self,
        entry: &Entry,
        _ctx: &FilterContext,
    ) -> Result<Option<Rejection>, ClassificationError> {
        let lang = self.gateway.detect_language(&entry.content).await?;
        if lang != ACCEPTED_LANGUAGE {
            return Ok(Some(Rejection::new(self.name(), lang)));
        }
        Ok(None)
    }
}

pub struct SpamFilter {
    gateway: ClassificationGateway,
}

impl SpamFilter {
    pub fn new(gateway: ClassificationGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Filter for SpamFilter {
    fn name(&self) -> &'static str {
        "spam"
    }

    async fn reject(
        &self,
        entry: &Entry,
        ctx: &FilterContext,
    ) -> Result<Option<Rejection>, ClassificationError> {
        if !ctx.use_spam_filter {
            return Ok(None);
        }
        if self.gateway.is_spam(&entry.content).await? {
            return Ok(Some(Rejection::new(self.name(), "spam")));
        }
        Ok(None)
    }
}

/// Blog-only: reject links matching any rule.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    rules: Vec<Regex>,
}

impl UrlFilter {
    pub fn new(rules: Vec<Regex>) -> Self {
        Self { rules }
    }

    /// First matching rule, if any.
    pub fn matching_rule(&self, url: &str) -> Option<&Regex> {
        self.rules.iter().find(|r| r.is_match(url))
    }
}

#[async_trait]
impl Filter for UrlFilter {
    fn name(&self) -> &'static str {
        "url"
    }

    async fn reject(
        &self,
        entry: &Entry,
        ctx: &FilterContext,
    ) -> Result<Option<Rejection>, ClassificationError> {
        if ctx.source != SourceKind::Blog {
            return Ok(None);
        }
        Ok(self
            .matching_rule(&entry.link)
            .map(|_| Rejection::new(self.name(), "urlfilter")))
    }
}

/// Twitter-only: reject exact (case-sensitive) author display names.
#[derive(Debug, Clone)]
pub struct AuthorFilter {
    names: HashSet<String>,
}

impl AuthorFilter {
    pub fn new(names: HashSet<String>) -> Self {
        Self { names }
    }

    pub fn is_blacklisted(&self, author: &str) -> bool {
        self.names.contains(author)
    }
}

#[async_trait]
impl Filter for AuthorFilter {
    fn name(&self) -> &'static str {
        "author"
    }

    async fn reject(
        &self,
        entry: &Entry,
        ctx: &FilterContext,
    ) -> Result<Option<Rejection>, ClassificationError> {
        if ctx.source != SourceKind::Twitter || !self.is_blacklisted(&entry.author_name) {
            return Ok(None);
        }
        Ok(Some(Rejection::new(self.name(), "authorfilter")))
    }
}

/// Immutable blacklist data behind the source-specific filters.
#[derive(Debug, Clone)]
pub struct FilterRules {
    pub url_rules: Vec<Regex>,
    pub author_blacklist: HashSet<String>,
}

impl FilterRules {
    pub fn from_patterns<U, A>(url_patterns: U, authors: A) -> Result<Self, regex::Error>
    where
        U: IntoIterator,
        U::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let url_rules = url_patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            url_rules,
            author_blacklist: authors.into_iter().map(Into::into).collect(),
        })
    }
}

impl Default for FilterRules {
    fn default() -> Self {
        Self::from_patterns(
            DEFAULT_URL_RULES.iter().copied(),
            DEFAULT_AUTHOR_BLACKLIST.iter().copied(),
        )
        .expect("valid default url rules")
    }
}

pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Filters are evaluated in the given order.
    pub fn new(filters: Vec<Box<dyn Filter>>) -> Self {
        Self { filters }
    }

    /// language -> spam -> url (blog) -> author (twitter)
    pub fn standard(gateway: &ClassificationGateway, rules: &FilterRules) -> Self {
        Self::new(vec![
            Box::new(LanguageFilter::new(gateway.clone())),
            Box::new(SpamFilter::new(gateway.clone())),
            Box::new(UrlFilter::new(rules.url_rules.clone())),
            Box::new(AuthorFilter::new(rules.author_blacklist.clone())),
        ])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run filters until one rejects. Later filters never see a rejected entry.
    pub async fn evaluate(
        &self,
        entry: &Entry,
        ctx: &FilterContext,
    ) -> Result<Option<Rejection>, ClassificationError> {
        for f in &self.filters {
            if let Some(rejection) = f.reject(entry, ctx).await? {
                return Ok(Some(rejection));
            }
        }
        Ok(None)
    }
}
