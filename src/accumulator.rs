//! Single-pass sparse accumulation of per-document token counts.
//!
//! The accumulator holds three append-only sequences encoding a
//! row-compressed matrix under construction:
//!
//! ```text
//! row_offsets: [0, 8, 17, ...]      one entry per document, plus the leading 0
//! col_indices: [0, 1, 2, 3, ...]    token ids, unique within each row
//! values:      [2, 1, 1, 1, ...]    per-document occurrence counts
//! ```
//!
//! [`freeze`](SparseAccumulator::freeze) turns them into an immutable
//! [`FrozenCorpusMatrix`]. The dense matrix is never materialized.

use std::mem;

use ahash::AHashMap;
use log::debug;

use crate::config::AccumulatorConfig;
use crate::error::{LexstatError, Result};
use crate::matrix::FrozenCorpusMatrix;
use crate::vocabulary::{TokenId, VocabularyIndex};

/// Incremental builder of a sparse term-document matrix.
///
/// # Example
///
/// ```
/// use lexstat::accumulator::SparseAccumulator;
/// use lexstat::config::AccumulatorConfig;
///
/// let mut acc = SparseAccumulator::new(AccumulatorConfig::default());
/// acc.push_document("b a b".split_whitespace()).unwrap();
/// acc.push_document("a c".split_whitespace()).unwrap();
///
/// let matrix = acc.freeze().unwrap();
/// assert_eq!(matrix.corpus_length(), 2);
/// assert_eq!(matrix.vocab_size(), 3);
/// assert_eq!(matrix.token_count(), 5);
/// assert!(acc.push_document(["d"]).is_err());
/// ```
#[derive(Debug)]
pub struct SparseAccumulator {
    config: AccumulatorConfig,
    vocabulary: VocabularyIndex,
    col_indices: Vec<TokenId>,
    row_offsets: Vec<usize>,
    values: Vec<u32>,
    accepted: usize,
    ignored: usize,
    frozen: bool,
}

impl SparseAccumulator {
    /// Create an empty accumulator.
    pub fn new(config: AccumulatorConfig) -> Self {
        SparseAccumulator {
            config,
            vocabulary: VocabularyIndex::new(),
            col_indices: Vec::new(),
            row_offsets: vec![0],
            values: Vec::new(),
            accepted: 0,
            ignored: 0,
            frozen: false,
        }
    }

    /// The construction-time configuration.
    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    /// Append one document.
    ///
    /// Returns `Ok(false)` when the document was ignored because `n_train`
    /// documents were already accepted, and fails once the accumulator is frozen.
    pub fn push_document<I, S>(&mut self, tokens: I) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.frozen {
            return Err(LexstatError::already_frozen(
                "cannot push documents after freeze()",
            ));
        }
        if !self.config.accepts(self.documents_seen()) {
            self.ignored += 1;
            if self.ignored == 1 {
                debug!(
                    "n_train limit of {} documents reached; ignoring further documents",
                    self.documents_seen()
                );
            }
            return Ok(false);
        }

        // Pre-aggregate so each token id appears at most once in this row.
        let mut counter: AHashMap<TokenId, u32> = AHashMap::new();
        let mut order: Vec<TokenId> = Vec::new();
        for token in tokens {
            let token = self.config.normalize(token.as_ref());
            let id = self.vocabulary.intern(&token)?;
            let count = counter.entry(id).or_insert_with(|| {
                order.push(id);
                0
            });
            *count += 1;
        }

        for id in order {
            self.col_indices.push(id);
            self.values.push(counter[&id]);
        }
        self.row_offsets.push(self.col_indices.len());
        self.accepted += 1;
        Ok(true)
    }

    /// Convert the accumulated rows into an immutable matrix.
    ///
    /// Column indices are sorted within each row before conversion. The
    /// accumulator's buffers are consumed; a second call fails.
    pub fn freeze(&mut self) -> Result<FrozenCorpusMatrix> {
        if self.frozen {
            return Err(LexstatError::already_frozen("freeze() was already called"));
        }
        self.frozen = true;

        let vocabulary = mem::take(&mut self.vocabulary);
        let row_offsets = mem::take(&mut self.row_offsets);
        let mut col_indices = mem::take(&mut self.col_indices);
        let mut values = mem::take(&mut self.values);

        sort_rows(&row_offsets, &mut col_indices, &mut values);

        let matrix = FrozenCorpusMatrix::from_rows(vocabulary, &row_offsets, &col_indices, &values);
        debug!(
            "Froze corpus: {} documents, {} types, {} stored entries ({} documents ignored)",
            matrix.corpus_length(),
            matrix.vocab_size(),
            matrix.nnz(),
            self.ignored
        );
        Ok(matrix)
    }

    /// Whether [`freeze`](Self::freeze) has been called.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Number of documents accepted so far.
    pub fn documents_seen(&self) -> usize {
        self.accepted
    }

    /// Number of documents dropped by the `n_train` bound.
    pub fn documents_ignored(&self) -> usize {
        self.ignored
    }

    /// Number of distinct tokens seen so far.
    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Number of stored (document, token) entries.
    pub fn nnz(&self) -> usize {
        self.col_indices.len()
    }

    /// The vocabulary under construction.
    pub fn vocabulary(&self) -> &VocabularyIndex {
        &self.vocabulary
    }
}

/// Sort each row's `(column, value)` pairs by column id, in place.
fn sort_rows(row_offsets: &[usize], col_indices: &mut [TokenId], values: &mut [u32]) {
    let mut pairs: Vec<(TokenId, u32)> = Vec::new();
    for window in row_offsets.windows(2) {
        let (start, end) = (window[0], window[1]);
        let cols = &col_indices[start..end];
        if cols.windows(2).all(|w| w[0] < w[1]) {
            continue;
        }
        pairs.clear();
        pairs.extend(cols.iter().copied().zip(values[start..end].iter().copied()));
        pairs.sort_unstable_by_key(|&(col, _)| col);
        for (k, (col, value)) in pairs.iter().enumerate() {
            col_indices[start + k] = *col;
            values[start + k] = *value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_all(acc: &mut SparseAccumulator, docs: &[&str]) {
        for doc in docs {
            acc.push_document(doc.split_whitespace()).unwrap();
        }
    }

    #[test]
    fn test_row_invariants() {
        let mut acc = SparseAccumulator::new(AccumulatorConfig::default());
        push_all(&mut acc, &["b a m b", "a a c"]);

        assert_eq!(acc.documents_seen(), 2);
        assert_eq!(acc.vocab_size(), 4);
        // Document 0 has 3 distinct tokens, document 1 has 2.
        assert_eq!(acc.row_offsets, vec![0, 3, 5]);
        assert_eq!(acc.values[0..3].iter().sum::<u32>(), 4);
        assert_eq!(acc.values[3..5].iter().sum::<u32>(), 3);
        assert_eq!(acc.nnz(), 5);
    }

    #[test]
    fn test_freeze_sorts_rows() {
        let mut acc = SparseAccumulator::new(AccumulatorConfig::default());
        // Document 1 introduces "c" (id 2) before reusing "a" (id 1).
        push_all(&mut acc, &["b a", "c a"]);
        assert_eq!(acc.col_indices, vec![0, 1, 2, 1]);

        let mut cols = acc.col_indices.clone();
        let mut vals = acc.values.clone();
        sort_rows(&acc.row_offsets, &mut cols, &mut vals);
        assert_eq!(cols, vec![0, 1, 1, 2]);

        let matrix = acc.freeze().unwrap();
        assert_eq!(matrix.column(1).collect::<Vec<_>>(), vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn test_lowercase() {
        let mut acc = SparseAccumulator::new(AccumulatorConfig::default().with_lowercase(true));
        push_all(&mut acc, &["The the THE cat"]);

        assert_eq!(acc.vocab_size(), 2);
        let matrix = acc.freeze().unwrap();
        let the = matrix.vocabulary().get("the").unwrap();
        assert_eq!(matrix.column_sum(the), Some(3));
        assert!(matrix.vocabulary().get("The").is_none());
    }

    #[test]
    fn test_n_train_ignores_extra_documents() {
        let mut acc = SparseAccumulator::new(AccumulatorConfig::default().with_n_train(2));
        assert!(acc.push_document(["a"]).unwrap());
        assert!(acc.push_document(["b"]).unwrap());
        assert!(!acc.push_document(["c"]).unwrap());
        assert!(!acc.push_document(["d"]).unwrap());

        assert_eq!(acc.documents_seen(), 2);
        assert_eq!(acc.documents_ignored(), 2);
        assert!(!acc.vocabulary().contains("c"));
    }

    #[test]
    fn test_push_after_freeze_fails() {
        let mut acc = SparseAccumulator::new(AccumulatorConfig::default());
        push_all(&mut acc, &["a b"]);
        acc.freeze().unwrap();

        assert!(acc.is_frozen());
        assert!(matches!(
            acc.push_document(["c"]),
            Err(LexstatError::AlreadyFrozen(_))
        ));
        assert!(matches!(acc.freeze(), Err(LexstatError::AlreadyFrozen(_))));
    }

    #[test]
    fn test_empty_document() {
        let mut acc = SparseAccumulator::new(AccumulatorConfig::default());
        acc.push_document(Vec::<String>::new()).unwrap();
        push_all(&mut acc, &["a"]);

        let matrix = acc.freeze().unwrap();
        assert_eq!(matrix.corpus_length(), 2);
        assert_eq!(matrix.doc_lengths(), &[0, 1]);
    }

    #[test]
    fn test_freeze_empty_corpus() {
        let mut acc = SparseAccumulator::new(AccumulatorConfig::default());
        let matrix = acc.freeze().unwrap();
        assert_eq!(matrix.corpus_length(), 0);
        assert_eq!(matrix.vocab_size(), 0);
        assert_eq!(matrix.token_count(), 0);
    }
}
