//! Corpus-level statistics over a frozen matrix.
//!
//! A [`CorpusStatistics`] is built from exactly one [`FrozenCorpusMatrix`] and
//! memoizes what it derives from it. A new freeze produces a new object, so no
//! cache is ever invalidated in place.

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::analysis::classifier::{EnglishTokenClassifier, TokenClassifier};
use crate::dispersion::DispersionEngine;
use crate::error::{LexstatError, Result};
use crate::lexicon::{self, Legomena, VocabCounts, VocabFilter};
use crate::matrix::FrozenCorpusMatrix;
use crate::storage::Storage;

/// Read-only statistics facade over a frozen corpus.
///
/// Safe to share across threads; every method takes `&self`.
///
/// # Example
///
/// ```
/// use lexstat::accumulator::SparseAccumulator;
/// use lexstat::config::AccumulatorConfig;
/// use lexstat::statistics::CorpusStatistics;
///
/// let mut acc = SparseAccumulator::new(AccumulatorConfig::default());
/// acc.push_document("the cat sat".split_whitespace()).unwrap();
/// acc.push_document("the dog sat".split_whitespace()).unwrap();
///
/// let stats = CorpusStatistics::new(acc.freeze().unwrap());
/// assert_eq!(stats.lookup("the").unwrap(), 2);
/// assert_eq!(stats.hapax_legomena(), &["cat", "dog"]);
/// assert!(stats.len().is_err());
/// ```
#[derive(Debug)]
pub struct CorpusStatistics {
    matrix: FrozenCorpusMatrix,
    classifier: Arc<dyn TokenClassifier>,
    legomena: OnceLock<Legomena>,
    counts: OnceLock<VocabCounts>,
    frequency_memo: Mutex<AHashMap<u64, f64>>,
}

impl CorpusStatistics {
    /// Wrap a frozen matrix, classifying tokens with the English defaults.
    pub fn new(matrix: FrozenCorpusMatrix) -> Self {
        Self::with_classifier(matrix, Arc::new(EnglishTokenClassifier::new()))
    }

    /// Wrap a frozen matrix with a custom stopword/punctuation classifier.
    pub fn with_classifier(
        matrix: FrozenCorpusMatrix,
        classifier: Arc<dyn TokenClassifier>,
    ) -> Self {
        CorpusStatistics {
            matrix,
            classifier,
            legomena: OnceLock::new(),
            counts: OnceLock::new(),
            frequency_memo: Mutex::new(AHashMap::new()),
        }
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> &FrozenCorpusMatrix {
        &self.matrix
    }

    /// The classifier used by [`get_vocab`](Self::get_vocab).
    pub fn classifier(&self) -> &dyn TokenClassifier {
        self.classifier.as_ref()
    }

    /// Number of distinct tokens.
    pub fn vocab_size(&self) -> usize {
        self.matrix.vocab_size()
    }

    /// Total number of tokens.
    pub fn token_count(&self) -> u64 {
        self.matrix.token_count()
    }

    /// Number of documents.
    pub fn corpus_length(&self) -> usize {
        self.matrix.corpus_length()
    }

    /// Always fails: use `vocab_size`, `token_count` or `corpus_length`.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> Result<usize> {
        Err(LexstatError::LengthAmbiguous)
    }

    /// `vocab_size / token_count`.
    pub fn type_token_ratio(&self) -> Result<f64> {
        lexicon::type_token_ratio(self.vocab_size(), self.token_count())
    }

    fn column_counts(&self) -> impl Iterator<Item = (&str, u64)> {
        self.matrix
            .vocabulary()
            .tokens()
            .iter()
            .map(String::as_str)
            .zip(self.matrix.column_sums().iter().copied())
    }

    /// All three frequency classes, computed on first use.
    pub fn legomena(&self) -> &Legomena {
        self.legomena
            .get_or_init(|| Legomena::partition(self.column_counts()))
    }

    /// Tokens occurring exactly once, in first-seen order.
    pub fn hapax_legomena(&self) -> &[String] {
        &self.legomena().hapax
    }

    /// Tokens occurring exactly twice, in first-seen order.
    pub fn dis_legomena(&self) -> &[String] {
        &self.legomena().dis
    }

    /// Tokens occurring three times or more, in first-seen order.
    pub fn mid_range_tokens(&self) -> &[String] {
        &self.legomena().mid_range
    }

    /// Share of the vocabulary occurring exactly `m` times. Memoized per `m`.
    pub fn frequency_distribution(&self, m: u64) -> Result<f64> {
        if let Some(&share) = self.frequency_memo.lock().get(&m) {
            return Ok(share);
        }
        let share = lexicon::frequency_share(self.matrix.column_sums().iter().copied(), m)?;
        self.frequency_memo.lock().insert(m, share);
        Ok(share)
    }

    /// Corpus frequency of a token; `NotFound` if it was never seen.
    pub fn lookup(&self, token: &str) -> Result<u64> {
        self.matrix
            .vocabulary()
            .get(token)
            .and_then(|id| self.matrix.column_sum(id))
            .ok_or_else(|| LexstatError::not_found(format!("token '{token}'")))
    }

    /// Whether the token is in the vocabulary.
    pub fn contains(&self, token: &str) -> bool {
        self.matrix.vocabulary().contains(token)
    }

    /// Per-document token counts, in arrival order.
    pub fn doc_lengths(&self) -> &[u64] {
        self.matrix.doc_lengths()
    }

    /// The token → count mapping, optionally transformed.
    ///
    /// With an identity filter the cached mapping is borrowed; otherwise a
    /// filtered copy is built.
    pub fn get_vocab(&self, filter: VocabFilter) -> Cow<'_, VocabCounts> {
        if filter.is_identity() {
            return Cow::Borrowed(self.vocab_counts());
        }
        Cow::Owned(lexicon::apply_filter(
            self.column_counts(),
            filter,
            self.classifier.as_ref(),
        ))
    }

    fn vocab_counts(&self) -> &VocabCounts {
        self.counts.get_or_init(|| {
            self.column_counts()
                .map(|(token, count)| (token.to_string(), count))
                .collect()
        })
    }

    /// A dispersion engine over this corpus.
    pub fn dispersion(&self) -> Result<DispersionEngine<'_>> {
        DispersionEngine::new(&self.matrix)
    }

    /// A serializable snapshot of the headline numbers.
    ///
    /// Ratios that are undefined for this corpus are `None`.
    pub fn summary(&self) -> CorpusSummary {
        let legomena = self.legomena();
        CorpusSummary {
            corpus_length: self.corpus_length(),
            vocab_size: self.vocab_size(),
            token_count: self.token_count(),
            type_token_ratio: self.type_token_ratio().ok(),
            hapax_count: legomena.hapax.len(),
            dis_count: legomena.dis.len(),
            mid_range_count: legomena.mid_range.len(),
            frequency_distribution: (1..=3)
                .map(|m| FrequencyShare {
                    m,
                    share: self.frequency_distribution(m).ok(),
                })
                .collect(),
        }
    }

    /// Persist the underlying matrix.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        self.matrix.save(storage)
    }

    /// Load statistics from a saved matrix.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        Ok(Self::new(FrozenCorpusMatrix::load(storage)?))
    }
}

/// Headline numbers of a corpus or tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub corpus_length: usize,
    pub vocab_size: usize,
    pub token_count: u64,
    pub type_token_ratio: Option<f64>,
    pub hapax_count: usize,
    pub dis_count: usize,
    pub mid_range_count: usize,
    pub frequency_distribution: Vec<FrequencyShare>,
}

/// One point of the frequency distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyShare {
    pub m: u64,
    pub share: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::SparseAccumulator;
    use crate::analysis::classifier::StopwordSet;
    use crate::config::AccumulatorConfig;
    use crate::storage::memory::MemoryStorage;

    fn build(docs: &[&str]) -> CorpusStatistics {
        let mut acc = SparseAccumulator::new(AccumulatorConfig::default());
        for doc in docs {
            acc.push_document(doc.split_whitespace()).unwrap();
        }
        CorpusStatistics::new(acc.freeze().unwrap())
    }

    #[test]
    fn test_counts_and_lookup() {
        let stats = build(&["The cat . the cat", "a dog ."]);
        assert_eq!(stats.vocab_size(), 6);
        assert_eq!(stats.token_count(), 8);
        assert_eq!(stats.corpus_length(), 2);
        assert_eq!(stats.lookup("cat").unwrap(), 2);
        assert!(matches!(stats.lookup("bird"), Err(LexstatError::NotFound(_))));
        assert!(stats.contains("The"));
        assert!(!stats.contains("THE"));
        assert!(matches!(stats.len(), Err(LexstatError::LengthAmbiguous)));
    }

    #[test]
    fn test_legomena_partition_vocabulary() {
        let stats = build(&["x y y z z z", "z w"]);
        assert_eq!(stats.hapax_legomena(), &["x", "w"]);
        assert_eq!(stats.dis_legomena(), &["y"]);
        assert_eq!(stats.mid_range_tokens(), &["z"]);

        let legomena = stats.legomena();
        assert_eq!(
            legomena.hapax.len() + legomena.dis.len() + legomena.mid_range.len(),
            stats.vocab_size()
        );
    }

    #[test]
    fn test_frequency_distribution_memoized() {
        let stats = build(&["x y y z z z", "z w"]);
        assert_eq!(stats.frequency_distribution(1).unwrap(), 0.5);
        assert_eq!(stats.frequency_distribution(1).unwrap(), 0.5);
        assert_eq!(stats.frequency_distribution(4).unwrap(), 0.25);
        assert_eq!(stats.frequency_distribution(9).unwrap(), 0.0);
        assert_eq!(stats.frequency_memo.lock().len(), 3);
    }

    #[test]
    fn test_empty_corpus_ratios_undefined() {
        let stats = build(&[]);
        assert!(matches!(
            stats.type_token_ratio(),
            Err(LexstatError::DivisionUndefined(_))
        ));
        assert!(matches!(
            stats.frequency_distribution(1),
            Err(LexstatError::DivisionUndefined(_))
        ));
        assert!(stats.dispersion().is_err());

        let summary = stats.summary();
        assert_eq!(summary.type_token_ratio, None);
        assert_eq!(summary.frequency_distribution[0].share, None);
    }

    #[test]
    fn test_get_vocab_identity_is_borrowed() {
        let stats = build(&["The cat . the cat", "a dog ."]);
        let first = stats.get_vocab(VocabFilter::default());
        assert!(matches!(first, Cow::Borrowed(_)));
        assert_eq!(first["cat"], 2);
        assert_eq!(first.len(), 6);
        assert_eq!(stats.get_vocab(VocabFilter::default()), first);
    }

    #[test]
    fn test_get_vocab_filters() {
        let stats = build(&["The cat . the cat", "a dog ."]);

        let lower = stats.get_vocab(VocabFilter::new().lowercase());
        assert!(matches!(lower, Cow::Owned(_)));
        assert_eq!(lower["the"], 2);

        let content = stats.get_vocab(
            VocabFilter::new()
                .lowercase()
                .exclude_stopwords()
                .exclude_punctuation(),
        );
        let mut tokens: Vec<_> = content.keys().cloned().collect();
        tokens.sort();
        assert_eq!(tokens, vec!["cat", "dog"]);
    }

    #[test]
    fn test_custom_classifier() {
        let mut acc = SparseAccumulator::new(AccumulatorConfig::default());
        acc.push_document(["foo", "bar", "the"]).unwrap();
        let stats = CorpusStatistics::with_classifier(
            acc.freeze().unwrap(),
            Arc::new(StopwordSet::new(["foo"])),
        );

        let vocab = stats.get_vocab(VocabFilter::new().exclude_stopwords());
        assert!(!vocab.contains_key("foo"));
        assert!(vocab.contains_key("the"));
        assert!(stats.classifier().is_stopword("foo"));
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::default();
        let stats = build(&["b a m", "a b b"]);
        stats.save(&storage).unwrap();

        let restored = CorpusStatistics::load(&storage).unwrap();
        assert_eq!(restored.doc_lengths(), stats.doc_lengths());
        assert_eq!(restored.get_vocab(VocabFilter::default()), stats.get_vocab(VocabFilter::default()));
        assert_eq!(restored.summary(), stats.summary());
    }

    #[test]
    fn test_statistics_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CorpusStatistics>();
        assert_send_sync::<FrozenCorpusMatrix>();
    }
}
