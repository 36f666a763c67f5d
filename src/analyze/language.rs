//! Stop-word frequency language detector.
//!
//! Counts how many tokens of the text are stop words of each supported
//! language and picks the best-scoring one. Text with no stop-word signal at
//! all (short tweets, bare links) gets the fallback code.

use async_trait::async_trait;

use crate::analyze::gateway::LanguageDetector;
use crate::error::ClassificationError;

const STOPWORDS: &[(&str, &[&str])] = &[
    (
        "en",
        &[
            "the", "and", "is", "are", "was", "were", "this", "that", "with", "for", "not",
            "you", "have", "has", "it", "of", "to", "in", "on", "be", "my", "what", "just",
            "but", "they", "we", "from", "at", "your", "will", "can", "do", "does", "an",
        ],
    ),
    (
        "fr",
        &[
            "le", "la", "les", "et", "est", "un", "une", "des", "du", "pour", "pas", "que",
            "qui", "dans", "sur", "avec", "ce", "je", "nous", "vous", "mais", "ou", "au",
            "aux", "il", "elle", "sont", "tres", "c'est",
        ],
    ),
    (
        "de",
        &[
            "der", "die", "das", "und", "ist", "nicht", "ein", "eine", "ich", "mit", "auf",
            "den", "dem", "zu", "sich", "auch", "es", "wir", "sie", "aber", "noch", "wie",
        ],
    ),
    (
        "es",
        &[
            "el", "los", "las", "y", "es", "un", "una", "que", "por", "para", "con", "no",
            "del", "pero", "muy", "como", "esta", "este", "yo", "lo", "se", "su",
        ],
    ),
    (
        "it",
        &[
            "il", "lo", "gli", "e", "di", "che", "non", "un", "una", "per", "sono", "con",
            "della", "questo", "ma", "anche", "come", "ho", "nel", "alla",
        ],
    ),
    (
        "pt",
        &[
            "o", "os", "as", "e", "um", "uma", "que", "nao", "para", "com", "do", "da",
            "em", "muito", "isso", "mas", "eu", "voce", "por", "mais",
        ],
    ),
    (
        "nl",
        &[
            "de", "het", "een", "en", "is", "niet", "dat", "van", "ik", "je", "op", "met",
            "voor", "maar", "ook", "zijn", "wat", "dit", "naar",
        ],
    ),
];

#[derive(Debug, Clone)]
pub struct StopwordDetector {
    fallback: String,
}

impl Default for StopwordDetector {
    fn default() -> Self {
        Self::new("en")
    }
}

impl StopwordDetector {
    pub fn new(fallback: &str) -> Self {
        Self {
            fallback: fallback.to_string(),
        }
    }

    /// Synchronous core of the detector.
    pub fn detect_sync(&self, text: &str) -> String {
        let plain = crate::ingest::normalize_text(text).to_lowercase();
        let tokens: Vec<&str> = plain
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .collect();

        let mut best: Option<(&str, usize)> = None;
        for (code, words) in STOPWORDS {
            let hits = tokens.iter().filter(|t| words.contains(*t)).count();
            // Strictly greater: earlier languages (English first) win ties.
            if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
                best = Some((*code, hits));
            }
        }

        best.map(|(code, _)| code.to_string())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl LanguageDetector for StopwordDetector {
    async fn detect(&self, text: &str) -> Result<String, ClassificationError> {
        Ok(self.detect_sync(text))
    }
}
