//! Streaming token tallies with duplicate-pass rectification.
//!
//! A [`PassTally`] never freezes: it keeps a running token → count mapping and
//! per-document lengths, so it can be read at any time. When the same corpus
//! is replayed several times (e.g. one pass per training epoch) before the
//! corpus boundary is known, the [`DuplicatePassDetector`] infers the corpus
//! length and [`rectify`](PassTally::rectify) rescales counts to one pass.
//!
//! ```
//! use lexstat::config::AccumulatorConfig;
//! use lexstat::tally::PassTally;
//!
//! let docs = ["b a m", "b a a"];
//! let mut tally = PassTally::new(AccumulatorConfig::default());
//! for _ in 0..3 {
//!     for doc in docs {
//!         tally.push_text(doc, doc.split_whitespace()).unwrap();
//!     }
//! }
//! assert_eq!(tally.lookup("a").unwrap(), 9);
//!
//! tally.rectify().unwrap();
//! assert_eq!(tally.lookup("a").unwrap(), 3);
//! assert_eq!(tally.doc_lengths(), &[3, 3]);
//! ```

pub mod detector;

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use ahash::AHashSet;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

pub use self::detector::{DuplicatePassDetector, PassState};
use crate::analysis::classifier::{EnglishTokenClassifier, TokenClassifier};
use crate::config::AccumulatorConfig;
use crate::error::{LexstatError, Result};
use crate::lexicon::{self, Legomena, VocabCounts, VocabFilter};
use crate::statistics::{CorpusSummary, FrequencyShare};
use crate::storage::Storage;
use crate::storage::blob::{read_blob, read_json, write_blob, write_json};
use crate::vocabulary::{TokenId, VocabularyIndex};

const COUNTS_FILE: &str = "vocabulary.bin";
const DOC_LENGTHS_FILE: &str = "doc_lengths.bin";
const HASHES_FILE: &str = "pass_hashes.bin";
const META_FILE: &str = "tally.json";

const COUNTS_MAGIC: [u8; 4] = *b"LXTV";
const DOC_LENGTHS_MAGIC: [u8; 4] = *b"LXDL";
const HASHES_MAGIC: [u8; 4] = *b"LXPH";
const FORMAT_VERSION: u32 = 1;

/// Running token counts over a document stream that may repeat.
#[derive(Debug)]
pub struct PassTally {
    config: AccumulatorConfig,
    vocabulary: VocabularyIndex,
    counts: Vec<u64>,
    doc_lengths: Vec<u64>,
    call_count: usize,
    ignored: usize,
    detector: DuplicatePassDetector,
    classifier: Arc<dyn TokenClassifier>,
    /// Unfiltered count map, dropped whenever the counts change.
    vocab_view: OnceLock<VocabCounts>,
}

impl PassTally {
    /// Create an empty tally.
    pub fn new(config: AccumulatorConfig) -> Self {
        PassTally {
            config,
            vocabulary: VocabularyIndex::new(),
            counts: Vec::new(),
            doc_lengths: Vec::new(),
            call_count: 0,
            ignored: 0,
            detector: DuplicatePassDetector::new(),
            classifier: Arc::new(EnglishTokenClassifier::new()),
            vocab_view: OnceLock::new(),
        }
    }

    /// Replace the stopword/punctuation classifier used by [`get_vocab`](Self::get_vocab).
    pub fn with_classifier(mut self, classifier: Arc<dyn TokenClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// The construction-time configuration.
    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    /// Add one document whose exact text is `text`, tokenized as `tokens`.
    ///
    /// The text is what the duplicate-pass detector hashes. Returns `Ok(false)`
    /// when the document was ignored by the `n_train` bound; such documents are
    /// neither counted nor hashed.
    pub fn push_text<I, S>(&mut self, text: &str, tokens: I) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.admit()? {
            return Ok(false);
        }
        let hash = self.detector.hash_text(text);
        self.record(tokens, hash)
    }

    /// Add one document given only as tokens; the token sequence is hashed.
    pub fn push_document<I, S>(&mut self, tokens: I) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.admit()? {
            return Ok(false);
        }
        let tokens: Vec<S> = tokens.into_iter().collect();
        let hash = self.detector.hash_tokens(&tokens);
        self.record(tokens, hash)
    }

    fn admit(&mut self) -> Result<bool> {
        if self.detector.is_rectified() {
            return Err(LexstatError::already_rectified(
                "cannot accumulate after rectify()",
            ));
        }
        if !self.config.accepts(self.call_count) {
            self.ignored += 1;
            if self.ignored == 1 {
                debug!(
                    "n_train limit of {} documents reached; ignoring further documents",
                    self.call_count
                );
            }
            return Ok(false);
        }
        Ok(true)
    }

    fn record<I, S>(&mut self, tokens: I, hash: u64) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.vocab_view.take();
        let mut length = 0u64;
        for token in tokens {
            let token = self.config.normalize(token.as_ref());
            let id = self.vocabulary.intern(&token)? as usize;
            if id == self.counts.len() {
                self.counts.push(0);
            }
            self.counts[id] += 1;
            length += 1;
        }
        self.doc_lengths.push(length);
        self.call_count += 1;
        self.detector.observe(hash, self.call_count)?;
        Ok(true)
    }

    /// Rescale counts accumulated over several passes to a single pass.
    ///
    /// Fails with `NotNecessary` before a duplicate pass was detected and with
    /// `AlreadyRectified` on a second call.
    pub fn rectify(&mut self) -> Result<()> {
        let corpus_length = self.detector.mark_rectified()?;
        let passes = (self.call_count / corpus_length).max(1) as u64;
        if self.call_count % corpus_length != 0 {
            warn!(
                "{} calls is not a whole number of passes over {} documents; rounding down to {} passes",
                self.call_count, corpus_length, passes
            );
        }

        let mut vocabulary = VocabularyIndex::new();
        let mut counts = Vec::with_capacity(self.counts.len());
        for (token, &count) in self.vocabulary.tokens().iter().zip(&self.counts) {
            let rescaled = count / passes;
            if rescaled > 0 {
                vocabulary.intern(token)?;
                counts.push(rescaled);
            }
        }
        let dropped = self.vocabulary.len() - vocabulary.len();
        self.vocabulary = vocabulary;
        self.counts = counts;
        self.doc_lengths.truncate(corpus_length);
        self.vocab_view.take();

        debug!(
            "Rectified {} calls as {} passes over {} documents ({} tokens dropped)",
            self.call_count, passes, corpus_length, dropped
        );
        Ok(())
    }

    /// Current duplicate-pass state.
    pub fn pass_state(&self) -> PassState {
        self.detector.state()
    }

    /// The corpus length inferred by the detector, if any.
    pub fn inferred_corpus_length(&self) -> Option<usize> {
        self.detector.inferred_corpus_length()
    }

    /// Whether [`rectify`](Self::rectify) succeeded.
    pub fn is_rectified(&self) -> bool {
        self.detector.is_rectified()
    }

    /// Number of accepted documents, across all passes.
    pub fn call_count(&self) -> usize {
        self.call_count
    }

    /// Number of documents dropped by the `n_train` bound.
    pub fn documents_ignored(&self) -> usize {
        self.ignored
    }

    /// `(token, count)` pairs in first-seen order.
    pub fn vocabulary(&self) -> impl Iterator<Item = (&str, u64)> {
        self.vocabulary
            .tokens()
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().copied())
    }

    /// Per-document lengths, in arrival order.
    pub fn doc_lengths(&self) -> &[u64] {
        &self.doc_lengths
    }

    /// Number of distinct tokens.
    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Sum of document lengths.
    pub fn token_count(&self) -> u64 {
        self.doc_lengths.iter().sum()
    }

    /// Number of recorded documents.
    pub fn corpus_length(&self) -> usize {
        self.doc_lengths.len()
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

    /// Count of a token; `NotFound` if it is not in the vocabulary.
    pub fn lookup(&self, token: &str) -> Result<u64> {
        self.vocabulary
            .get(token)
            .map(|id: TokenId| self.counts[id as usize])
            .ok_or_else(|| LexstatError::not_found(format!("token '{token}'")))
    }

    /// Whether the token is in the vocabulary.
    pub fn contains(&self, token: &str) -> bool {
        self.vocabulary.contains(token)
    }

    /// Tokens partitioned by count, in first-seen order.
    pub fn legomena(&self) -> Legomena {
        Legomena::partition(self.vocabulary())
    }

    /// Tokens counted exactly once.
    pub fn hapax_legomena(&self) -> Vec<String> {
        self.legomena().hapax
    }

    /// Tokens counted exactly twice.
    pub fn dis_legomena(&self) -> Vec<String> {
        self.legomena().dis
    }

    /// Tokens counted three times or more.
    pub fn mid_range_tokens(&self) -> Vec<String> {
        self.legomena().mid_range
    }

    /// Share of the vocabulary counted exactly `m` times.
    pub fn frequency_distribution(&self, m: u64) -> Result<f64> {
        lexicon::frequency_share(self.counts.iter().copied(), m)
    }

    /// The token → count mapping, optionally transformed.
    ///
    /// The unfiltered mapping is built once per change of the counts and
    /// borrowed on later calls.
    pub fn get_vocab(&self, filter: VocabFilter) -> Cow<'_, VocabCounts> {
        if filter.is_identity() {
            return Cow::Borrowed(self.vocab_view.get_or_init(|| {
                self.vocabulary()
                    .map(|(token, count)| (token.to_string(), count))
                    .collect()
            }));
        }
        Cow::Owned(lexicon::apply_filter(
            self.vocabulary(),
            filter,
            self.classifier.as_ref(),
        ))
    }

    /// Headline numbers, in the same shape as frozen corpus summaries.
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

    /// Persist the tally into a storage namespace.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let counts: Vec<(&str, u64)> = self.vocabulary().collect();
        write_blob(storage, COUNTS_FILE, COUNTS_MAGIC, &counts)?;
        write_blob(storage, DOC_LENGTHS_FILE, DOC_LENGTHS_MAGIC, &self.doc_lengths)?;

        let state = self.detector.state();
        if state == PassState::Accumulating {
            write_blob(storage, HASHES_FILE, HASHES_MAGIC, &self.detector.hash_counts())?;
        } else {
            storage.delete_file(HASHES_FILE)?;
        }

        write_json(
            storage,
            META_FILE,
            &TallyMeta {
                format_version: FORMAT_VERSION,
                call_count: self.call_count,
                documents_ignored: self.ignored,
                config: self.config,
                pass_state: state,
            },
        )?;
        storage.sync()?;

        info!(
            "Saved pass tally: {} calls, {} types, state {:?}",
            self.call_count,
            self.vocab_size(),
            state
        );
        Ok(())
    }

    /// Whether a storage namespace holds a saved tally.
    pub fn exists_in(storage: &dyn Storage) -> bool {
        storage.file_exists(META_FILE)
    }

    /// Load a tally written by [`save`](Self::save).
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        let meta: TallyMeta = read_json(storage, META_FILE)?;
        if meta.format_version != FORMAT_VERSION {
            return Err(LexstatError::storage(format!(
                "Unsupported tally format version: {}",
                meta.format_version
            )));
        }
        meta.config.validate()?;

        let pairs: Vec<(String, u64)> = read_blob(storage, COUNTS_FILE, COUNTS_MAGIC)?;
        let doc_lengths: Vec<u64> = read_blob(storage, DOC_LENGTHS_FILE, DOC_LENGTHS_MAGIC)?;
        let hashes: Vec<(u64, u32)> = if meta.pass_state == PassState::Accumulating {
            read_blob(storage, HASHES_FILE, HASHES_MAGIC)?
        } else {
            Vec::new()
        };

        let (tokens, counts): (Vec<String>, Vec<u64>) = pairs.into_iter().unzip();
        let vocabulary = VocabularyIndex::from_tokens(tokens)
            .ok_or_else(|| LexstatError::storage("Duplicate token in stored tally"))?;

        let mut seen = AHashSet::with_capacity(hashes.len());
        if hashes.iter().any(|(hash, _)| !seen.insert(*hash)) {
            return Err(LexstatError::storage("Duplicate hash in stored tally"));
        }

        info!(
            "Loaded pass tally: {} calls, {} types",
            meta.call_count,
            vocabulary.len()
        );
        Ok(PassTally {
            config: meta.config,
            vocabulary,
            counts,
            doc_lengths,
            call_count: meta.call_count,
            ignored: meta.documents_ignored,
            detector: DuplicatePassDetector::from_parts(meta.pass_state, hashes),
            classifier: Arc::new(EnglishTokenClassifier::new()),
            vocab_view: OnceLock::new(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TallyMeta {
    format_version: u32,
    call_count: usize,
    documents_ignored: usize,
    config: AccumulatorConfig,
    pass_state: PassState,
}
