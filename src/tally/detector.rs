//! Duplicate-pass detection by document-content hashing.
//!
//! While accumulating, every document's content hash is counted. Once every
//! hash seen so far has been seen at least twice, the stream is assumed to have
//! wrapped around into its second pass: the corpus length is fixed at half the
//! calls observed and the hash table is dropped.
//!
//! This is a heuristic. It assumes every pass replays exactly the same texts,
//! and it fires early if a document legitimately repeats within one pass.

use ahash::{AHashMap, RandomState};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{LexstatError, Result};

// Fixed seeds keep hashes comparable across a save/load cycle.
const SEEDS: [u64; 4] = [
    0x6c65_7873_7461_7430,
    0x9e37_79b9_7f4a_7c15,
    0xbf58_476d_1ce4_e5b9,
    0x94d0_49bb_1331_11eb,
];

/// Where a stream stands in the duplicate-pass protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PassState {
    /// No full repetition detected yet.
    Accumulating,
    /// Every document has been seen at least twice.
    DuplicateSeen {
        /// Inferred number of documents per pass.
        corpus_length: usize,
    },
    /// Counts were rescaled to a single pass. Terminal.
    Rectified {
        /// Inferred number of documents per pass.
        corpus_length: usize,
    },
}

impl PassState {
    /// The inferred corpus length, once duplication was detected.
    pub fn corpus_length(&self) -> Option<usize> {
        match *self {
            PassState::Accumulating => None,
            PassState::DuplicateSeen { corpus_length }
            | PassState::Rectified { corpus_length } => Some(corpus_length),
        }
    }
}

/// Tracks content hashes until a second pass is detected.
#[derive(Debug, Clone)]
pub struct DuplicatePassDetector {
    state: PassState,
    hash_counts: AHashMap<u64, u32>,
    // Hashes seen fewer than two times.
    pending: usize,
    hasher: RandomState,
}

impl Default for DuplicatePassDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicatePassDetector {
    /// Create a detector in the `Accumulating` state.
    pub fn new() -> Self {
        DuplicatePassDetector {
            state: PassState::Accumulating,
            hash_counts: AHashMap::new(),
            pending: 0,
            hasher: RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]),
        }
    }

    /// Rebuild a detector from persisted parts.
    ///
    /// `hashes` is only meaningful in the `Accumulating` state and is ignored otherwise.
    pub fn from_parts(state: PassState, hashes: Vec<(u64, u32)>) -> Self {
        let mut detector = Self::new();
        detector.state = state;
        if state == PassState::Accumulating {
            detector.pending = hashes.iter().filter(|(_, count)| *count < 2).count();
            detector.hash_counts = hashes.into_iter().collect();
        }
        detector
    }

    /// Current state.
    pub fn state(&self) -> PassState {
        self.state
    }

    /// The inferred corpus length, once duplication was detected.
    pub fn inferred_corpus_length(&self) -> Option<usize> {
        self.state.corpus_length()
    }

    /// Whether rectification already happened.
    pub fn is_rectified(&self) -> bool {
        matches!(self.state, PassState::Rectified { .. })
    }

    /// Number of distinct hashes currently tracked.
    pub fn tracked_hashes(&self) -> usize {
        self.hash_counts.len()
    }

    /// Hash a document's exact text.
    pub fn hash_text(&self, text: &str) -> u64 {
        self.hasher.hash_one(text)
    }

    /// Hash a document given only as a token sequence.
    pub fn hash_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> u64 {
        let joined: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
        self.hasher.hash_one(joined)
    }

    /// Record one accepted document. `calls` is the call count including it.
    ///
    /// Returns the inferred corpus length if this call completed the second pass.
    pub fn observe(&mut self, hash: u64, calls: usize) -> Result<Option<usize>> {
        match self.state {
            PassState::Rectified { .. } => Err(LexstatError::already_rectified(
                "cannot accumulate after rectify()",
            )),
            PassState::DuplicateSeen { .. } => Ok(None),
            PassState::Accumulating => {
                let count = self.hash_counts.entry(hash).or_insert(0);
                *count += 1;
                match *count {
                    1 => self.pending += 1,
                    2 => self.pending -= 1,
                    _ => {}
                }

                if self.pending == 0 {
                    let corpus_length = calls / 2;
                    debug!(
                        "Duplicate pass detected after {calls} documents; inferred corpus length {corpus_length}"
                    );
                    self.state = PassState::DuplicateSeen { corpus_length };
                    self.hash_counts = AHashMap::new();
                    return Ok(Some(corpus_length));
                }
                Ok(None)
            }
        }
    }

    /// Move `DuplicateSeen` to `Rectified`, returning the corpus length.
    pub fn mark_rectified(&mut self) -> Result<usize> {
        match self.state {
            PassState::Accumulating => Err(LexstatError::not_necessary(
                "no duplicate pass has been detected",
            )),
            PassState::Rectified { .. } => {
                Err(LexstatError::already_rectified("rectify() was already called"))
            }
            PassState::DuplicateSeen { corpus_length } => {
                self.state = PassState::Rectified { corpus_length };
                Ok(corpus_length)
            }
        }
    }

    /// Pending hash counts, for persistence.
    pub fn hash_counts(&self) -> Vec<(u64, u32)> {
        let mut counts: Vec<(u64, u32)> = self.hash_counts.iter().map(|(&h, &c)| (h, c)).collect();
        counts.sort_unstable();
        counts
    }
}
