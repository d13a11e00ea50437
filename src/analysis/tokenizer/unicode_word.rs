//! Unicode word tokenizer implementation.
//!
//! Splits text using Unicode word boundary rules (UAX #29).
//!
//! ```
//! use lexstat::analysis::tokenizer::Tokenizer;
//! use lexstat::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
//!
//! let tokenizer = UnicodeWordTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello, world!").unwrap().collect();
//! assert_eq!(tokens, vec!["Hello", "world"]);
//!
//! let tokenizer = UnicodeWordTokenizer::with_punctuation();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello, world!").unwrap().collect();
//! assert_eq!(tokens, vec!["Hello", ",", "world", "!"]);
//! ```

use unicode_segmentation::UnicodeSegmentation;

use super::{TokenStream, Tokenizer};
use crate::error::Result;

/// A tokenizer that follows Unicode word boundaries.
#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer {
    keep_punctuation: bool,
}

impl UnicodeWordTokenizer {
    /// Word segments only; punctuation and whitespace are dropped.
    pub fn new() -> Self {
        UnicodeWordTokenizer {
            keep_punctuation: false,
        }
    }

    /// Every non-whitespace segment, so punctuation becomes its own token.
    ///
    /// Use this when the vocabulary should later be filtered with
    /// `exclude_punctuation`.
    pub fn with_punctuation() -> Self {
        UnicodeWordTokenizer {
            keep_punctuation: true,
        }
    }

    /// Whether punctuation segments are emitted.
    pub fn keeps_punctuation(&self) -> bool {
        self.keep_punctuation
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> Result<TokenStream<'a>> {
        if self.keep_punctuation {
            Ok(Box::new(
                text.split_word_bounds()
                    .filter(|segment| !segment.trim().is_empty()),
            ))
        } else {
            Ok(Box::new(text.unicode_words()))
        }
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_only() {
        let tokenizer = UnicodeWordTokenizer::new();
        let tokens: Vec<_> = tokenizer
            .tokenize("The quick (\"brown\") fox can't jump 32.3 feet.")
            .unwrap()
            .collect();
        assert_eq!(
            tokens,
            vec!["The", "quick", "brown", "fox", "can't", "jump", "32.3", "feet"]
        );
    }

    #[test]
    fn test_with_punctuation() {
        let tokenizer = UnicodeWordTokenizer::with_punctuation();
        assert!(tokenizer.keeps_punctuation());
        let tokens: Vec<_> = tokenizer.tokenize("a, b.").unwrap().collect();
        assert_eq!(tokens, vec!["a", ",", "b", "."]);
    }
}
