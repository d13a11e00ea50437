//! # lexstat
//!
//! Incremental term-document accumulation and corpus statistics for Rust.
//!
//! ## Features
//!
//! - Streaming sparse accumulation of tokenized documents, frozen once into
//!   an immutable compressed-column matrix
//! - Vocabulary statistics: lookups, hapax/dis legomena, frequency
//!   distribution, type-token ratio, stop word and punctuation filtering
//! - Dispersion measures per token (range, VC, Juilland's D, Carroll's D2,
//!   Rosengren's S, DP, DP_norm, KL divergence)
//! - A running tally that detects replayed passes over the same corpus and
//!   rescales its counts to a single pass
//! - Checksummed snapshots on pluggable storage backends
//!
//! ## Example
//!
//! ```
//! use lexstat::config::AccumulatorConfig;
//! use lexstat::session::CorpusSession;
//!
//! let mut session = CorpusSession::new(AccumulatorConfig::default());
//! session.push_document("b a m n".split_whitespace()).unwrap();
//! session.push_document("b a s a".split_whitespace()).unwrap();
//!
//! let stats = session.freeze().unwrap();
//! assert_eq!(stats.lookup("a").unwrap(), 3);
//! assert_eq!(stats.doc_lengths(), &[4, 4]);
//!
//! let a = stats.dispersion().unwrap().token_stats_for("a").unwrap();
//! assert_eq!(a.range, 2);
//! ```

pub mod accumulator;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod dispersion;
pub mod error;
pub mod lexicon;
pub mod matrix;
pub mod session;
pub mod statistics;
pub mod storage;
pub mod tally;
pub mod vocabulary;

pub mod prelude {
    pub use crate::accumulator::SparseAccumulator;
    pub use crate::config::AccumulatorConfig;
    pub use crate::dispersion::{DispersionEngine, DispersionStats, TokenDispersion};
    pub use crate::error::{LexstatError, Result};
    pub use crate::lexicon::VocabFilter;
    pub use crate::matrix::FrozenCorpusMatrix;
    pub use crate::session::CorpusSession;
    pub use crate::statistics::CorpusStatistics;
    pub use crate::tally::{PassState, PassTally};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
