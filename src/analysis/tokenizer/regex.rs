//! Regex-based tokenizer implementation.

use std::sync::Arc;

use regex::Regex;

use super::{TokenStream, Tokenizer};
use crate::error::{LexstatError, Result};

/// A tokenizer that emits regex matches (or, with gaps, the text between them).
#[derive(Clone, Debug)]
pub struct RegexTokenizer {
    pattern: Arc<Regex>,
    gaps: bool,
}

impl RegexTokenizer {
    /// Create a tokenizer matching runs of word characters (`\w+`).
    pub fn new() -> Result<Self> {
        Self::with_pattern(r"\w+")
    }

    /// Create a tokenizer that emits every match of `pattern`.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        Ok(RegexTokenizer {
            pattern: Arc::new(compile(pattern)?),
            gaps: false,
        })
    }

    /// Create a tokenizer that treats matches of `pattern` as separators.
    pub fn with_gaps(pattern: &str) -> Result<Self> {
        Ok(RegexTokenizer {
            pattern: Arc::new(compile(pattern)?),
            gaps: true,
        })
    }

    /// The regex source.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Whether matches are separators rather than tokens.
    pub fn gaps(&self) -> bool {
        self.gaps
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| LexstatError::analysis(format!("Invalid regex pattern: {e}")))
}

impl Tokenizer for RegexTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> Result<TokenStream<'a>> {
        if self.gaps {
            Ok(Box::new(
                self.pattern.split(text).filter(|piece| !piece.is_empty()),
            ))
        } else {
            Ok(Box::new(self.pattern.find_iter(text).map(|m| m.as_str())))
        }
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}
