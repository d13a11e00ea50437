//! Immutable column-major term-document matrix.
//!
//! Rows are documents in arrival order, columns are tokens in vocabulary id
//! order. Column sums (corpus frequency per token) and row sums (document
//! lengths) are computed once at construction.

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{LexstatError, Result};
use crate::storage::Storage;
use crate::storage::blob::{read_blob, read_json, write_blob, write_json};
use crate::vocabulary::{TokenId, VocabularyIndex};

/// Row index of a document in the matrix.
pub type DocId = u32;

const VOCABULARY_FILE: &str = "vocabulary.bin";
const MATRIX_FILE: &str = "matrix.bin";
const META_FILE: &str = "corpus.json";

const VOCABULARY_MAGIC: [u8; 4] = *b"LXVC";
const MATRIX_MAGIC: [u8; 4] = *b"LXMX";
const FORMAT_VERSION: u32 = 1;

/// Immutable sparse documents × vocabulary count matrix (compressed sparse columns).
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenCorpusMatrix {
    vocabulary: VocabularyIndex,
    n_rows: usize,
    /// `col_offsets[c]..col_offsets[c + 1]` indexes the entries of column `c`.
    col_offsets: Vec<usize>,
    row_indices: Vec<DocId>,
    values: Vec<u64>,
    column_sums: Vec<u64>,
    row_sums: Vec<u64>,
    token_count: u64,
}

impl FrozenCorpusMatrix {
    /// Build from row-compressed parts. Column indices within each row must be
    /// unique; they need not be sorted.
    pub(crate) fn from_rows(
        vocabulary: VocabularyIndex,
        row_offsets: &[usize],
        col_indices: &[TokenId],
        row_values: &[u32],
    ) -> Self {
        let n_rows = row_offsets.len().saturating_sub(1);
        let n_cols = vocabulary.len();
        let nnz = col_indices.len();

        // Counting sort by column; iterating rows in order keeps each column's
        // row indices ascending.
        let mut col_offsets = vec![0usize; n_cols + 1];
        for &col in col_indices {
            col_offsets[col as usize + 1] += 1;
        }
        for c in 0..n_cols {
            col_offsets[c + 1] += col_offsets[c];
        }

        let mut cursor = col_offsets[..n_cols].to_vec();
        let mut row_indices = vec![0 as DocId; nnz];
        let mut values = vec![0u64; nnz];
        let mut row_sums = vec![0u64; n_rows];

        for row in 0..n_rows {
            for k in row_offsets[row]..row_offsets[row + 1] {
                let col = col_indices[k] as usize;
                let dst = cursor[col];
                row_indices[dst] = row as DocId;
                values[dst] = u64::from(row_values[k]);
                cursor[col] += 1;
                row_sums[row] += u64::from(row_values[k]);
            }
        }

        Self::assemble(vocabulary, n_rows, col_offsets, row_indices, values, row_sums)
    }

    fn assemble(
        vocabulary: VocabularyIndex,
        n_rows: usize,
        col_offsets: Vec<usize>,
        row_indices: Vec<DocId>,
        values: Vec<u64>,
        row_sums: Vec<u64>,
    ) -> Self {
        let column_sums: Vec<u64> = col_offsets
            .windows(2)
            .map(|w| values[w[0]..w[1]].iter().sum())
            .collect();
        let token_count = row_sums.iter().sum();

        FrozenCorpusMatrix {
            vocabulary,
            n_rows,
            col_offsets,
            row_indices,
            values,
            column_sums,
            row_sums,
            token_count,
        }
    }

    /// Build from column-compressed parts, validating every structural invariant.
    pub fn from_columns(
        vocabulary: VocabularyIndex,
        n_rows: usize,
        col_offsets: Vec<usize>,
        row_indices: Vec<DocId>,
        values: Vec<u64>,
    ) -> Result<Self> {
        let n_cols = vocabulary.len();
        if col_offsets.len() != n_cols + 1 {
            return Err(LexstatError::storage(format!(
                "Column offsets have {} entries, expected {}",
                col_offsets.len(),
                n_cols + 1
            )));
        }
        if col_offsets[0] != 0 || col_offsets[n_cols] != values.len() {
            return Err(LexstatError::storage("Column offsets do not span the entries"));
        }
        if row_indices.len() != values.len() {
            return Err(LexstatError::storage(
                "Row index and value arrays differ in length",
            ));
        }

        if col_offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(LexstatError::storage("Column offsets are not monotone"));
        }
        if col_offsets.iter().any(|&o| o > values.len()) {
            return Err(LexstatError::storage("Column offset past the last entry"));
        }

        let mut row_sums = vec![0u64; n_rows];
        for (col, window) in col_offsets.windows(2).enumerate() {
            let (start, end) = (window[0], window[1]);
            // Every vocabulary token occurs at least once.
            if start == end {
                return Err(LexstatError::storage(format!("Column {col} has no entries")));
            }
            let mut previous: Option<DocId> = None;
            for k in start..end {
                let row = row_indices[k];
                if row as usize >= n_rows {
                    return Err(LexstatError::storage(format!(
                        "Row index {row} out of range for {n_rows} documents"
                    )));
                }
                if previous.is_some_and(|p| p >= row) {
                    return Err(LexstatError::storage("Row indices are not ascending"));
                }
                if values[k] == 0 {
                    return Err(LexstatError::storage("Explicit zero entry in matrix"));
                }
                row_sums[row as usize] += values[k];
                previous = Some(row);
            }
        }

        Ok(Self::assemble(
            vocabulary,
            n_rows,
            col_offsets,
            row_indices,
            values,
            row_sums,
        ))
    }

    /// The frozen vocabulary (column labels).
    pub fn vocabulary(&self) -> &VocabularyIndex {
        &self.vocabulary
    }

    /// Number of documents (rows).
    pub fn corpus_length(&self) -> usize {
        self.n_rows
    }

    /// Number of distinct tokens (columns).
    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Sum of all entries.
    pub fn token_count(&self) -> u64 {
        self.token_count
    }

    /// Number of stored (nonzero) entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Per-document token counts.
    pub fn row_sums(&self) -> &[u64] {
        &self.row_sums
    }

    /// Alias of [`row_sums`](Self::row_sums).
    pub fn doc_lengths(&self) -> &[u64] {
        &self.row_sums
    }

    /// Per-token corpus frequencies, in id order.
    pub fn column_sums(&self) -> &[u64] {
        &self.column_sums
    }

    /// Corpus frequency of one token.
    pub fn column_sum(&self, id: TokenId) -> Option<u64> {
        self.column_sums.get(id as usize).copied()
    }

    fn column_range(&self, id: TokenId) -> Option<std::ops::Range<usize>> {
        let c = id as usize;
        if c >= self.vocab_size() {
            return None;
        }
        Some(self.col_offsets[c]..self.col_offsets[c + 1])
    }

    /// Nonzero `(doc_id, count)` entries of a column, documents ascending.
    pub fn column(&self, id: TokenId) -> impl Iterator<Item = (DocId, u64)> + '_ {
        let range = self.column_range(id).unwrap_or(0..0);
        self.row_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Number of documents in which the token occurs.
    pub fn column_nnz(&self, id: TokenId) -> usize {
        self.column_range(id).map_or(0, |r| r.len())
    }

    /// Zero-filled view of one column across all documents.
    pub fn dense_column(&self, id: TokenId) -> Vec<f64> {
        let mut dense = vec![0.0; self.n_rows];
        for (doc, count) in self.column(id) {
            dense[doc as usize] = count as f64;
        }
        dense
    }

    /// Persist the matrix into a storage namespace.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        write_blob(storage, VOCABULARY_FILE, VOCABULARY_MAGIC, &self.vocabulary)?;
        let blob = MatrixBlob {
            n_rows: self.n_rows as u64,
            col_offsets: self.col_offsets.iter().map(|&o| o as u64).collect(),
            row_indices: self.row_indices.clone(),
            values: self.values.clone(),
        };
        write_blob(storage, MATRIX_FILE, MATRIX_MAGIC, &blob)?;
        write_json(
            storage,
            META_FILE,
            &MatrixMeta {
                format_version: FORMAT_VERSION,
                corpus_length: self.n_rows,
                vocab_size: self.vocab_size(),
                token_count: self.token_count,
                nnz: self.nnz(),
            },
        )?;
        storage.sync()?;

        info!(
            "Saved frozen corpus: {} documents, {} tokens, {} types",
            self.n_rows,
            self.token_count,
            self.vocab_size()
        );
        Ok(())
    }

    /// Whether a storage namespace holds a saved matrix.
    pub fn exists_in(storage: &dyn Storage) -> bool {
        storage.file_exists(META_FILE)
    }

    /// Load a matrix previously written by [`save`](Self::save).
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        let meta: MatrixMeta = read_json(storage, META_FILE)?;
        if meta.format_version != FORMAT_VERSION {
            return Err(LexstatError::storage(format!(
                "Unsupported corpus format version: {}",
                meta.format_version
            )));
        }

        let vocabulary: VocabularyIndex = read_blob(storage, VOCABULARY_FILE, VOCABULARY_MAGIC)?;
        let blob: MatrixBlob = read_blob(storage, MATRIX_FILE, MATRIX_MAGIC)?;
        let matrix = FrozenCorpusMatrix::from_columns(
            vocabulary,
            blob.n_rows as usize,
            blob.col_offsets.into_iter().map(|o| o as usize).collect(),
            blob.row_indices,
            blob.values,
        )?;

        if matrix.corpus_length() != meta.corpus_length
            || matrix.vocab_size() != meta.vocab_size
            || matrix.token_count() != meta.token_count
        {
            return Err(LexstatError::storage(
                "Corpus metadata does not match stored matrix",
            ));
        }

        info!(
            "Loaded frozen corpus: {} documents, {} types",
            matrix.corpus_length(),
            matrix.vocab_size()
        );
        Ok(matrix)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MatrixBlob {
    n_rows: u64,
    col_offsets: Vec<u64>,
    row_indices: Vec<DocId>,
    values: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MatrixMeta {
    format_version: u32,
    corpus_length: usize,
    vocab_size: usize,
    token_count: u64,
    nnz: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    /// Two documents: "x y x" and "y z".
    fn small_matrix() -> FrozenCorpusMatrix {
        let vocabulary =
            VocabularyIndex::from_tokens(vec!["x".into(), "y".into(), "z".into()]).unwrap();
        // Row 1 lists its columns out of order on purpose.
        FrozenCorpusMatrix::from_rows(vocabulary, &[0, 2, 4], &[0, 1, 2, 1], &[2, 1, 1, 1])
    }

    #[test]
    fn test_shape_and_sums() {
        let matrix = small_matrix();
        assert_eq!(matrix.corpus_length(), 2);
        assert_eq!(matrix.vocab_size(), 3);
        assert_eq!(matrix.nnz(), 4);
        assert_eq!(matrix.token_count(), 5);
        assert_eq!(matrix.row_sums(), &[3, 2]);
        assert_eq!(matrix.column_sums(), &[2, 2, 1]);
        assert_eq!(matrix.column_sum(1), Some(2));
        assert_eq!(matrix.column_sum(3), None);
    }

    #[test]
    fn test_column_access() {
        let matrix = small_matrix();
        let y: Vec<_> = matrix.column(1).collect();
        assert_eq!(y, vec![(0, 1), (1, 1)]);

        let z: Vec<_> = matrix.column(2).collect();
        assert_eq!(z, vec![(1, 1)]);

        assert_eq!(matrix.column(7).count(), 0);
        assert_eq!(matrix.column_nnz(2), 1);
        assert_eq!(matrix.dense_column(2), vec![0.0, 1.0]);
        assert_eq!(matrix.dense_column(0), vec![2.0, 0.0]);
    }

    #[test]
    fn test_from_columns_validates() {
        let vocabulary = VocabularyIndex::from_tokens(vec!["x".into()]).unwrap();

        let bad_row = FrozenCorpusMatrix::from_columns(vocabulary.clone(), 1, vec![0, 1], vec![3], vec![1]);
        assert!(bad_row.is_err());

        let zero = FrozenCorpusMatrix::from_columns(vocabulary.clone(), 1, vec![0, 1], vec![0], vec![0]);
        assert!(zero.is_err());

        let unsorted = FrozenCorpusMatrix::from_columns(
            vocabulary.clone(),
            2,
            vec![0, 2],
            vec![1, 0],
            vec![1, 1],
        );
        assert!(unsorted.is_err());

        let ok = FrozenCorpusMatrix::from_columns(vocabulary, 2, vec![0, 2], vec![0, 1], vec![1, 4])
            .unwrap();
        assert_eq!(ok.row_sums(), &[1, 4]);
    }

    #[test]
    fn test_from_columns_rejects_empty_column() {
        let vocabulary = VocabularyIndex::from_tokens(vec!["x".into(), "y".into()]).unwrap();
        let result = FrozenCorpusMatrix::from_columns(vocabulary, 1, vec![0, 1, 1], vec![0], vec![3]);
        assert!(matches!(result, Err(LexstatError::Storage(_))));
    }

    #[test]
    fn test_from_columns_rejects_offsets_past_entries() {
        let vocabulary = VocabularyIndex::from_tokens(vec!["x".into(), "y".into()]).unwrap();
        let result = FrozenCorpusMatrix::from_columns(vocabulary, 1, vec![0, 2, 1], vec![0], vec![1]);
        assert!(matches!(result, Err(LexstatError::Storage(_))));
    }

    #[test]
    fn test_load_rejects_empty_column_snapshot() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        let vocabulary = VocabularyIndex::from_tokens(vec!["x".into(), "y".into()]).unwrap();
        write_blob(&storage, VOCABULARY_FILE, VOCABULARY_MAGIC, &vocabulary).unwrap();
        let blob = MatrixBlob {
            n_rows: 1,
            col_offsets: vec![0, 1, 1],
            row_indices: vec![0],
            values: vec![3],
        };
        write_blob(&storage, MATRIX_FILE, MATRIX_MAGIC, &blob).unwrap();
        write_json(
            &storage,
            META_FILE,
            &MatrixMeta {
                format_version: FORMAT_VERSION,
                corpus_length: 1,
                vocab_size: 2,
                token_count: 3,
                nnz: 1,
            },
        )
        .unwrap();

        assert!(matches!(
            FrozenCorpusMatrix::load(&storage),
            Err(LexstatError::Storage(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        let matrix = small_matrix();

        assert!(!FrozenCorpusMatrix::exists_in(&storage));
        matrix.save(&storage).unwrap();
        assert!(FrozenCorpusMatrix::exists_in(&storage));

        let restored = FrozenCorpusMatrix::load(&storage).unwrap();
        assert_eq!(restored, matrix);
    }

    #[test]
    fn test_load_missing() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        assert!(FrozenCorpusMatrix::load(&storage).is_err());
    }
}
