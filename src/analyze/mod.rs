// src/analyze/mod.rs
//! Entry analysis: classifier capabilities, their shipped implementations, and
//! the rejection filter chain built on top of them.

pub mod filters;
pub mod gateway;
pub mod language;
pub mod sentiment;
pub mod spam;

use std::sync::Arc;

pub use crate::analyze::filters::{Filter, FilterChain, FilterContext, FilterRules, Rejection};
pub use crate::analyze::gateway::{
    ClassificationGateway, LanguageDetector, Sentiment, SentimentClassifier, SpamClassifier,
};
pub use crate::analyze::language::StopwordDetector;
pub use crate::analyze::sentiment::LexiconClassifier;
pub use crate::analyze::spam::{RuleSpamClassifier, SpamRules};

/// Gateway over the built-in local classifiers.
pub fn local_gateway(language_fallback: &str, spam_rules: &SpamRules) -> ClassificationGateway {
    ClassificationGateway::new(
        Arc::new(StopwordDetector::new(language_fallback)),
        Arc::new(LexiconClassifier::new()),
        Arc::new(RuleSpamClassifier::new(spam_rules)),
    )
}
