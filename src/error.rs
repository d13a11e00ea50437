//! Error types for the lexstat library.
//!
//! All errors are represented by the [`LexstatError`] enum. Corpus-state errors
//! (`NotFrozen`, `AlreadyFrozen`, rectification misuse) are recoverable: callers
//! are expected to check `is_frozen()` or the pass state before calling guarded
//! operations, or to handle the returned error.
//!
//! # Examples
//!
//! ```
//! use lexstat::error::{LexstatError, Result};
//!
//! fn ratio(vocab: usize, tokens: u64) -> Result<f64> {
//!     if tokens == 0 {
//!         return Err(LexstatError::division_undefined("type-token ratio of an empty corpus"));
//!     }
//!     Ok(vocab as f64 / tokens as f64)
//! }
//!
//! assert!(ratio(0, 0).is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for lexstat operations.
#[derive(Error, Debug)]
pub enum LexstatError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A statistic was requested before the corpus was frozen.
    #[error("Corpus not frozen: {0}")]
    NotFrozen(String),

    /// A mutation was attempted after the corpus was frozen.
    #[error("Corpus already frozen: {0}")]
    AlreadyFrozen(String),

    /// A token (or token id, or stored blob) that was never seen.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A ratio with a zero (or degenerate) denominator.
    #[error("Division undefined: {0}")]
    DivisionUndefined(String),

    /// Rectification requested before any duplicate pass was detected.
    #[error("Rectification not necessary: {0}")]
    NotNecessary(String),

    /// Rectification (or accumulation) requested after rectification.
    #[error("Already rectified: {0}")]
    AlreadyRectified(String),

    /// A bare "length" was requested.
    #[error(
        "Length is ambiguous. Use vocab_size, token_count, or corpus_length instead"
    )]
    LengthAmbiguous,

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Analysis-related errors (tokenizer construction, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with LexstatError.
pub type Result<T> = std::result::Result<T, LexstatError>;

impl LexstatError {
    /// Create a new not-frozen error.
    pub fn not_frozen<S: Into<String>>(msg: S) -> Self {
        LexstatError::NotFrozen(msg.into())
    }

    /// Create a new already-frozen error.
    pub fn already_frozen<S: Into<String>>(msg: S) -> Self {
        LexstatError::AlreadyFrozen(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        LexstatError::NotFound(msg.into())
    }

    /// Create a new division-undefined error.
    pub fn division_undefined<S: Into<String>>(msg: S) -> Self {
        LexstatError::DivisionUndefined(msg.into())
    }

    /// Create a new not-necessary error.
    pub fn not_necessary<S: Into<String>>(msg: S) -> Self {
        LexstatError::NotNecessary(msg.into())
    }

    /// Create a new already-rectified error.
    pub fn already_rectified<S: Into<String>>(msg: S) -> Self {
        LexstatError::AlreadyRectified(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        LexstatError::Storage(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        LexstatError::Analysis(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        LexstatError::Serialization(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LexstatError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        LexstatError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        LexstatError::Other(format!("Invalid configuration: {}", msg.into()))
    }

    /// Whether this error is one of the corpus-state errors a caller can avoid
    /// by checking state first.
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            LexstatError::NotFrozen(_)
                | LexstatError::AlreadyFrozen(_)
                | LexstatError::NotNecessary(_)
                | LexstatError::AlreadyRectified(_)
        )
    }
}
