//! Whitespace tokenizer implementation.

use super::{TokenStream, Tokenizer};
use crate::error::Result;

/// A tokenizer that splits text on Unicode whitespace.
///
/// This is the tokenization the bundled corpus fixtures assume: one token per
/// whitespace-separated word, punctuation left attached.
#[derive(Clone, Debug, Default)]
pub struct WhitespaceTokenizer;

impl WhitespaceTokenizer {
    /// Create a new whitespace tokenizer.
    pub fn new() -> Self {
        WhitespaceTokenizer
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> Result<TokenStream<'a>> {
        Ok(Box::new(text.split_whitespace()))
    }

    fn name(&self) -> &'static str {
        "whitespace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_tokenizer() {
        let tokenizer = WhitespaceTokenizer::new();
        let tokens: Vec<_> = tokenizer
            .tokenize("  hello\tworld\n test, ")
            .unwrap()
            .collect();
        assert_eq!(tokens, vec!["hello", "world", "test,"]);
    }

    #[test]
    fn test_empty_text() {
        let tokenizer = WhitespaceTokenizer::new();
        assert_eq!(tokenizer.tokenize("   ").unwrap().count(), 0);
    }
}
