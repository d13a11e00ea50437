//! Vocabulary-level helpers shared by frozen statistics and pass tallies.
//!
//! Everything here works on `(token, count)` pairs in first-seen order, so the
//! same code serves the frozen matrix's column sums and a tally's counts.

use std::borrow::Cow;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::analysis::classifier::TokenClassifier;
use crate::error::{LexstatError, Result};

/// Token → corpus frequency.
pub type VocabCounts = AHashMap<String, u64>;

/// Tokens partitioned by corpus frequency.
///
/// Each list keeps first-seen order. Tokens with a zero count belong to no class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legomena {
    /// Tokens occurring exactly once.
    pub hapax: Vec<String>,
    /// Tokens occurring exactly twice.
    pub dis: Vec<String>,
    /// Tokens occurring three times or more.
    pub mid_range: Vec<String>,
}

impl Legomena {
    /// Partition `(token, count)` pairs in a single pass.
    pub fn partition<'a, I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        let mut legomena = Legomena::default();
        for (token, count) in counts {
            match count {
                0 => {}
                1 => legomena.hapax.push(token.to_string()),
                2 => legomena.dis.push(token.to_string()),
                _ => legomena.mid_range.push(token.to_string()),
            }
        }
        legomena
    }
}

/// Share of the vocabulary whose corpus frequency is exactly `m`.
///
/// Fails with `DivisionUndefined` for an empty vocabulary.
pub fn frequency_share<I>(counts: I, m: u64) -> Result<f64>
where
    I: IntoIterator<Item = u64>,
{
    let mut vocab_size = 0usize;
    let mut matching = 0usize;
    for count in counts {
        vocab_size += 1;
        if count == m {
            matching += 1;
        }
    }
    if vocab_size == 0 {
        return Err(LexstatError::division_undefined(
            "frequency distribution of an empty vocabulary",
        ));
    }
    Ok(matching as f64 / vocab_size as f64)
}

/// Type-token ratio, failing with `DivisionUndefined` when there are no tokens.
pub fn type_token_ratio(vocab_size: usize, token_count: u64) -> Result<f64> {
    if token_count == 0 {
        return Err(LexstatError::division_undefined(
            "type-token ratio of an empty corpus",
        ));
    }
    Ok(vocab_size as f64 / token_count as f64)
}

/// Optional transformations applied by `get_vocab`, in field order.
///
/// # Example
///
/// ```
/// use lexstat::lexicon::VocabFilter;
///
/// let filter = VocabFilter::new().lowercase().exclude_stopwords();
/// assert!(!filter.is_identity());
/// assert!(VocabFilter::default().is_identity());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabFilter {
    /// Merge counts of tokens that differ only by case.
    pub lowercase: bool,
    /// Drop stopwords (checked after lowercasing).
    pub exclude_stopwords: bool,
    /// Drop punctuation-only tokens.
    pub exclude_punctuation: bool,
}

impl VocabFilter {
    /// A filter that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable lowercase merging.
    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    /// Enable stopword exclusion.
    pub fn exclude_stopwords(mut self) -> Self {
        self.exclude_stopwords = true;
        self
    }

    /// Enable punctuation exclusion.
    pub fn exclude_punctuation(mut self) -> Self {
        self.exclude_punctuation = true;
        self
    }

    /// Whether no transformation is requested.
    pub fn is_identity(&self) -> bool {
        !(self.lowercase || self.exclude_stopwords || self.exclude_punctuation)
    }
}

/// Build a filtered copy of a vocabulary.
///
/// Lowercase merging runs first, then stopword exclusion, then punctuation
/// exclusion, each only when requested.
pub fn apply_filter<'a, I>(
    counts: I,
    filter: VocabFilter,
    classifier: &dyn TokenClassifier,
) -> VocabCounts
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let mut filtered = VocabCounts::new();
    for (token, count) in counts {
        let token: Cow<'_, str> = if filter.lowercase {
            Cow::Owned(token.to_lowercase())
        } else {
            Cow::Borrowed(token)
        };
        if filter.exclude_stopwords && classifier.is_stopword(&token) {
            continue;
        }
        if filter.exclude_punctuation && classifier.is_punctuation(&token) {
            continue;
        }
        *filtered.entry(token.into_owned()).or_insert(0) += count;
    }
    filtered
}

/// The `n` most frequent tokens, ties broken alphabetically.
pub fn most_frequent(counts: &VocabCounts, n: usize) -> Vec<(&str, u64)> {
    let mut ranked: Vec<(&str, u64)> = counts
        .iter()
        .map(|(token, &count)| (token.as_str(), count))
        .collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(n);
    ranked
}
