//! Construction-time configuration shared by both accumulation modes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LexstatError, Result};

/// Configuration for a [`SparseAccumulator`](crate::accumulator::SparseAccumulator)
/// or a [`PassTally`](crate::tally::PassTally).
///
/// # Example
///
/// ```
/// use lexstat::config::AccumulatorConfig;
///
/// let config = AccumulatorConfig::default().with_lowercase(true).with_n_train(1000);
/// assert!(config.lowercase);
/// assert_eq!(config.n_train, Some(1000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AccumulatorConfig {
    /// Fold tokens to lowercase before interning. Applied once, irreversibly.
    pub lowercase: bool,

    /// Stop accepting documents once this many have been accepted.
    /// Further pushes are silently ignored.
    pub n_train: Option<usize>,
}

impl AccumulatorConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable lowercase folding.
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Bound accumulation to `n_train` documents.
    pub fn with_n_train(mut self, n_train: usize) -> Self {
        self.n_train = Some(n_train);
        self
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: AccumulatorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n_train == Some(0) {
            return Err(LexstatError::invalid_config(
                "n_train must be at least 1 when set",
            ));
        }
        Ok(())
    }

    /// Whether a document arriving after `accepted` accepted documents should be taken.
    pub(crate) fn accepts(&self, accepted: usize) -> bool {
        self.n_train.is_none_or(|limit| accepted < limit)
    }

    /// Apply the configured normalization to a token.
    pub(crate) fn normalize<'a>(&self, token: &'a str) -> std::borrow::Cow<'a, str> {
        if self.lowercase {
            std::borrow::Cow::Owned(token.to_lowercase())
        } else {
            std::borrow::Cow::Borrowed(token)
        }
    }
}
