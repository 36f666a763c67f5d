use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::analyze::gateway::{Sentiment, SentimentClassifier};
use crate::error::ClassificationError;
use crate::ingest::normalize_text;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Word-lexicon sentiment classifier with short-range negation.
#[derive(Debug, Clone, Default)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Returns (score, token count).
    /// A negator within the previous 1..=3 tokens flips the sign of a word's score.
    pub fn score_text(&self, text: &str) -> (i32, usize) {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut score: i32 = 0;

        for i in 0..tokens.len() {
            let base = self.word_score(tokens[i].as_str());
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            score += if negated { -base } else { base };
        }

        (score, tokens.len())
    }
}

#[async_trait]
impl SentimentClassifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment, ClassificationError> {
        let description = normalize_text(text);
        let (score, _) = self.score_text(&description);
        Ok(Sentiment {
            polarity: score as f32,
            description,
        })
    }
}

/// Alphanumeric tokens, lower-case.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// Contractions arrive split by the tokenizer ("doesn't" -> "doesn", "t").
fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "cannot"
            | "without"
            | "isn"
            | "wasn"
            | "aren"
            | "don"
            | "doesn"
            | "didn"
            | "couldn"
            | "shouldn"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicon_loads() {
        assert!(LEXICON.len() > 50);
    }

    #[test]
    fn positive_and_negative_words() {
        let c = LexiconClassifier::new();
        assert_eq!(c.score_text("I love this, it is great").0, 5);
        assert_eq!(c.score_text("terrible and slow").0, -4);
        assert_eq!(c.score_text("it compiles").0, 0);
    }

    #[test]
    fn negation_flips_sign() {
        let c = LexiconClassifier::new();
        assert_eq!(c.score_text("this is not good").0, -2);
        assert_eq!(c.score_text("it doesn't crash anymore").0, 2);
    }

    #[tokio::test]
    async fn description_is_cleaned_content() {
        let s = LexiconClassifier::new()
            .classify("<p>Great&nbsp;<b>work</b></p>")
            .await
            .unwrap();
        assert_eq!(s.description, "Great work");
        assert_eq!(s.polarity, 2.0);
    }
}
