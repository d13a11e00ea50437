//! Tokenizers that split raw text into token strings.
//!
//! # Available Tokenizers
//!
//! - [`whitespace::WhitespaceTokenizer`] - Splits on whitespace characters
//! - [`unicode_word::UnicodeWordTokenizer`] - Uses Unicode word boundaries (UAX #29)
//! - [`regex::RegexTokenizer`] - Custom regex-based tokenization
//!
//! # Examples
//!
//! ```
//! use lexstat::analysis::tokenizer::Tokenizer;
//! use lexstat::analysis::tokenizer::whitespace::WhitespaceTokenizer;
//!
//! let tokenizer = WhitespaceTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("b a m n").unwrap().collect();
//! assert_eq!(tokens, vec!["b", "a", "m", "n"]);
//! ```

use std::str::FromStr;

use crate::error::{LexstatError, Result};

pub mod regex;
pub mod unicode_word;
pub mod whitespace;

/// Borrowed token strings produced from one text.
pub type TokenStream<'a> = Box<dyn Iterator<Item = &'a str> + 'a>;

/// Trait for tokenizers that convert text into tokens.
///
/// Tokens borrow from the input text; the accumulators copy only the strings
/// they have not seen before.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text.
    fn tokenize<'a>(&'a self, text: &'a str) -> Result<TokenStream<'a>>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// Tokenizer selection by name, as used on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenizerKind {
    /// [`whitespace::WhitespaceTokenizer`]
    #[default]
    Whitespace,
    /// [`unicode_word::UnicodeWordTokenizer`], keeping punctuation tokens.
    Unicode,
    /// [`regex::RegexTokenizer`]
    Regex,
}

impl FromStr for TokenizerKind {
    type Err = LexstatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "whitespace" => Ok(TokenizerKind::Whitespace),
            "unicode" | "unicode_word" => Ok(TokenizerKind::Unicode),
            "regex" => Ok(TokenizerKind::Regex),
            other => Err(LexstatError::analysis(format!("Unknown tokenizer: {other}"))),
        }
    }
}

impl TokenizerKind {
    /// Build the tokenizer. `pattern` is only consulted for [`TokenizerKind::Regex`].
    pub fn build(self, pattern: Option<&str>) -> Result<Box<dyn Tokenizer>> {
        Ok(match self {
            TokenizerKind::Whitespace => Box::new(whitespace::WhitespaceTokenizer::new()),
            TokenizerKind::Unicode => {
                Box::new(unicode_word::UnicodeWordTokenizer::with_punctuation())
            }
            TokenizerKind::Regex => match pattern {
                Some(pattern) => Box::new(regex::RegexTokenizer::with_pattern(pattern)?),
                None => Box::new(regex::RegexTokenizer::new()?),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            "Whitespace".parse::<TokenizerKind>().unwrap(),
            TokenizerKind::Whitespace
        );
        assert_eq!(
            "unicode".parse::<TokenizerKind>().unwrap(),
            TokenizerKind::Unicode
        );
        assert!("bogus".parse::<TokenizerKind>().is_err());
    }

    #[test]
    fn test_build() {
        let tokenizer = TokenizerKind::Regex.build(Some(r"[a-z]+")).unwrap();
        assert_eq!(tokenizer.name(), "regex");
        let tokens: Vec<_> = tokenizer.tokenize("ab, cd").unwrap().collect();
        assert_eq!(tokens, vec!["ab", "cd"]);

        assert!(TokenizerKind::Regex.build(Some("(")).is_err());
        assert_eq!(
            TokenizerKind::Unicode.build(None).unwrap().name(),
            "unicode_word"
        );
    }
}
