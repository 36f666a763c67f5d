//! Rule-based spam classifier.
//!
//! Content is spam when it contains any configured phrase (case-insensitive)
//! or carries more links than allowed.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::analyze::gateway::SpamClassifier;
use crate::error::ClassificationError;

static RE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bhttps?://").expect("link regex"));

fn default_phrases() -> Vec<String> {
    [
        "buy now",
        "click here",
        "free followers",
        "get followers",
        "work from home",
        "make money",
        "earn money",
        "limited time offer",
        "100% free",
        "casino",
        "viagra",
        "cheap pills",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_links() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SpamRules {
    #[serde(default = "default_phrases")]
    pub phrases: Vec<String>,
    /// More links than this marks the content as spam.
    #[serde(default = "default_max_links")]
    pub max_links: usize,
}

impl Default for SpamRules {
    fn default() -> Self {
        Self {
            phrases: default_phrases(),
            max_links: default_max_links(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuleSpamClassifier {
    phrases: Vec<String>,
    max_links: usize,
}

impl RuleSpamClassifier {
    pub fn new(rules: &SpamRules) -> Self {
        let phrases = rules
            .phrases
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            phrases,
            max_links: rules.max_links,
        }
    }

    pub fn is_spam_sync(&self, text: &str) -> bool {
        let lc = text.to_lowercase();
        if self.phrases.iter().any(|p| lc.contains(p.as_str())) {
            return true;
        }
        RE_LINK.find_iter(text).count() > self.max_links
    }
}

impl Default for RuleSpamClassifier {
    fn default() -> Self {
        Self::new(&SpamRules::default())
    }
}

#[async_trait]
impl SpamClassifier for RuleSpamClassifier {
    async fn is_spam(&self, text: &str) -> Result<bool, ClassificationError> {
        Ok(self.is_spam_sync(text))
    }
}
