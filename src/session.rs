//! The single-owner `Accumulating → Frozen` state machine.
//!
//! [`CorpusSession::statistics`] is the one path from a session to anything
//! derived from the frozen matrix, so the "must be frozen" check lives in a
//! single place.

use std::mem;

use log::debug;

use crate::accumulator::SparseAccumulator;
use crate::config::AccumulatorConfig;
use crate::error::{LexstatError, Result};
use crate::statistics::CorpusStatistics;
use crate::storage::Storage;

#[derive(Debug)]
enum SessionState {
    Accumulating(SparseAccumulator),
    Frozen(CorpusStatistics),
    // Only observable if freezing fails part-way.
    Poisoned,
}

/// An accumulation session that is frozen exactly once.
///
/// # Example
///
/// ```
/// use lexstat::config::AccumulatorConfig;
/// use lexstat::session::CorpusSession;
///
/// let mut session = CorpusSession::new(AccumulatorConfig::default());
/// session.push_document("b a m".split_whitespace()).unwrap();
/// assert!(session.statistics().is_err());
///
/// session.freeze().unwrap();
/// assert_eq!(session.statistics().unwrap().lookup("a").unwrap(), 1);
/// assert!(session.push_document(["x"]).is_err());
/// ```
#[derive(Debug)]
pub struct CorpusSession {
    state: SessionState,
}

impl CorpusSession {
    /// Start an empty session.
    pub fn new(config: AccumulatorConfig) -> Self {
        CorpusSession {
            state: SessionState::Accumulating(SparseAccumulator::new(config)),
        }
    }

    /// A session that is already frozen, e.g. after loading from storage.
    pub fn from_statistics(statistics: CorpusStatistics) -> Self {
        CorpusSession {
            state: SessionState::Frozen(statistics),
        }
    }

    /// Append one document; `Ok(false)` when ignored by the `n_train` bound.
    pub fn push_document<I, S>(&mut self, tokens: I) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match &mut self.state {
            SessionState::Accumulating(acc) => acc.push_document(tokens),
            _ => Err(LexstatError::already_frozen(
                "cannot push documents after freeze()",
            )),
        }
    }

    /// Freeze the accumulated documents. Fails if already frozen.
    pub fn freeze(&mut self) -> Result<&CorpusStatistics> {
        let mut accumulator = match mem::replace(&mut self.state, SessionState::Poisoned) {
            SessionState::Accumulating(acc) => acc,
            frozen => {
                self.state = frozen;
                return Err(LexstatError::already_frozen("freeze() was already called"));
            }
        };

        let matrix = accumulator.freeze()?;
        debug!(
            "Session frozen after {} accepted documents",
            matrix.corpus_length()
        );
        self.state = SessionState::Frozen(CorpusStatistics::new(matrix));
        self.statistics()
    }

    /// Whether [`freeze`](Self::freeze) has completed.
    pub fn is_frozen(&self) -> bool {
        matches!(self.state, SessionState::Frozen(_))
    }

    /// The frozen statistics; `NotFrozen` before freeze.
    pub fn statistics(&self) -> Result<&CorpusStatistics> {
        match &self.state {
            SessionState::Frozen(statistics) => Ok(statistics),
            _ => Err(LexstatError::not_frozen("call freeze() before reading statistics")),
        }
    }

    /// Consume the session, returning the frozen statistics.
    pub fn into_statistics(self) -> Result<CorpusStatistics> {
        match self.state {
            SessionState::Frozen(statistics) => Ok(statistics),
            _ => Err(LexstatError::not_frozen("call freeze() before reading statistics")),
        }
    }

    /// The accumulator, while the session is still accumulating.
    pub fn accumulator(&self) -> Option<&SparseAccumulator> {
        match &self.state {
            SessionState::Accumulating(acc) => Some(acc),
            _ => None,
        }
    }

    /// Number of distinct tokens seen so far (available in every state).
    pub fn vocab_size(&self) -> usize {
        match &self.state {
            SessionState::Accumulating(acc) => acc.vocab_size(),
            SessionState::Frozen(statistics) => statistics.vocab_size(),
            SessionState::Poisoned => 0,
        }
    }

    /// Always fails: use `vocab_size`, `token_count` or `corpus_length`.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> Result<usize> {
        Err(LexstatError::LengthAmbiguous)
    }

    /// Persist the frozen corpus; `NotFrozen` before freeze.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        self.statistics()?.save(storage)
    }

    /// Restore a frozen session saved with [`save`](Self::save).
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        Ok(Self::from_statistics(CorpusStatistics::load(storage)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::VocabFilter;
    use crate::storage::memory::MemoryStorage;

    #[test]
    fn test_reads_before_freeze_fail() {
        let mut session = CorpusSession::new(AccumulatorConfig::default());
        session.push_document(["a", "b"]).unwrap();

        assert!(!session.is_frozen());
        assert_eq!(session.vocab_size(), 2);
        assert!(session.accumulator().is_some());
        assert!(matches!(
            session.statistics(),
            Err(LexstatError::NotFrozen(_))
        ));
        assert!(session.save(&MemoryStorage::default()).is_err());
        assert!(matches!(session.len(), Err(LexstatError::LengthAmbiguous)));
    }

    #[test]
    fn test_freeze_once() {
        let mut session = CorpusSession::new(AccumulatorConfig::default());
        session.push_document(["a", "b", "a"]).unwrap();

        let stats = session.freeze().unwrap();
        assert_eq!(stats.token_count(), 3);

        assert!(matches!(
            session.freeze(),
            Err(LexstatError::AlreadyFrozen(_))
        ));
        // A failed second freeze leaves the statistics in place.
        assert!(session.is_frozen());
        assert_eq!(session.statistics().unwrap().lookup("a").unwrap(), 2);
        assert!(matches!(
            session.push_document(["c"]),
            Err(LexstatError::AlreadyFrozen(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::default();
        let mut session = CorpusSession::new(AccumulatorConfig::default().with_lowercase(true));
        session.push_document(["A", "b"]).unwrap();
        session.push_document(["a"]).unwrap();
        session.freeze().unwrap();
        session.save(&storage).unwrap();

        let restored = CorpusSession::load(&storage).unwrap();
        assert!(restored.is_frozen());
        let stats = restored.into_statistics().unwrap();
        assert_eq!(stats.lookup("a").unwrap(), 2);
        assert_eq!(stats.doc_lengths(), &[2, 1]);
        assert_eq!(stats.get_vocab(VocabFilter::default()).len(), 2);
    }
}
