//! Stopword and punctuation classification for vocabulary filtering.
//!
//! ```
//! use lexstat::analysis::classifier::{EnglishTokenClassifier, TokenClassifier};
//!
//! let classifier = EnglishTokenClassifier::new();
//! assert!(classifier.is_stopword("the"));
//! assert!(!classifier.is_stopword("corpus"));
//! assert!(classifier.is_punctuation("?!"));
//! assert!(!classifier.is_punctuation("a."));
//! ```

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;

/// Default English stop words list.
pub const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

static DEFAULT_ENGLISH_STOP_WORDS_SET: LazyLock<Arc<HashSet<String>>> = LazyLock::new(|| {
    Arc::new(
        DEFAULT_ENGLISH_STOP_WORDS
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
});

// A token is punctuation when every character is in a Unicode punctuation category.
static PUNCTUATION: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\p{P}+$").ok());

/// Decides which tokens `exclude_stopwords` and `exclude_punctuation` drop.
pub trait TokenClassifier: Send + Sync + std::fmt::Debug {
    /// Whether the token is a stopword.
    fn is_stopword(&self, token: &str) -> bool;

    /// Whether the token consists of punctuation only.
    fn is_punctuation(&self, token: &str) -> bool {
        is_unicode_punctuation(token)
    }
}

/// Whether every character of a non-empty token is Unicode punctuation.
pub fn is_unicode_punctuation(token: &str) -> bool {
    match PUNCTUATION.as_ref() {
        Some(regex) => regex.is_match(token),
        None => !token.is_empty() && token.chars().all(|c| c.is_ascii_punctuation()),
    }
}

/// A caller-supplied stopword list.
///
/// Matching is exact; include case variants explicitly if needed.
#[derive(Debug, Clone)]
pub struct StopwordSet {
    words: Arc<HashSet<String>>,
}

impl StopwordSet {
    /// Create a set from any list of words.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StopwordSet {
            words: Arc::new(words.into_iter().map(Into::into).collect()),
        }
    }

    /// The default English stop list.
    pub fn english() -> Self {
        StopwordSet {
            words: Arc::clone(&DEFAULT_ENGLISH_STOP_WORDS_SET),
        }
    }

    /// Number of stopwords.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether `word` is in the set.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}

impl TokenClassifier for StopwordSet {
    fn is_stopword(&self, token: &str) -> bool {
        self.contains(token)
    }
}

/// The default classifier: English stop list plus Unicode punctuation.
#[derive(Debug, Clone)]
pub struct EnglishTokenClassifier {
    stopwords: StopwordSet,
}

impl EnglishTokenClassifier {
    /// Create the default English classifier.
    pub fn new() -> Self {
        EnglishTokenClassifier {
            stopwords: StopwordSet::english(),
        }
    }
}

impl Default for EnglishTokenClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenClassifier for EnglishTokenClassifier {
    fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }
}
