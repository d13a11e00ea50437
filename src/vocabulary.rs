//! Token interning with stable, dense integer ids.
//!
//! Ids are assigned in first-seen order and double as matrix column indices.

use ahash::AHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LexstatError;

/// Column id of a token in the term-document matrix.
pub type TokenId = u32;

/// A mapping from token strings to dense ids in `[0, len())`.
///
/// There is exactly one insertion path ([`intern`](Self::intern)) and no removal.
///
/// # Example
///
/// ```
/// use lexstat::vocabulary::VocabularyIndex;
///
/// let mut vocab = VocabularyIndex::new();
/// assert_eq!(vocab.intern("b").unwrap(), 0);
/// assert_eq!(vocab.intern("a").unwrap(), 1);
/// assert_eq!(vocab.intern("b").unwrap(), 0);
/// assert_eq!(vocab.lookup(1), Some("a"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyIndex {
    ids: AHashMap<String, TokenId>,
    tokens: Vec<String>,
}

impl VocabularyIndex {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `token`, assigning the next sequential id on first sight.
    ///
    /// Fails once every [`TokenId`] is taken.
    pub fn intern(&mut self, token: &str) -> crate::error::Result<TokenId> {
        if let Some(&id) = self.ids.get(token) {
            return Ok(id);
        }
        let id = token_id(self.tokens.len())?;
        self.tokens.push(token.to_string());
        self.ids.insert(token.to_string(), id);
        Ok(id)
    }

    /// Id of a token, if it was ever interned.
    pub fn get(&self, token: &str) -> Option<TokenId> {
        self.ids.get(token).copied()
    }

    /// Reverse lookup: token string for an id.
    pub fn lookup(&self, id: TokenId) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    /// Whether the token was ever interned.
    pub fn contains(&self, token: &str) -> bool {
        self.ids.contains_key(token)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no token has been interned.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate `(id, token)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &str)> {
        self.tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (id as TokenId, token.as_str()))
    }

    /// Tokens in id order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Rebuild an index from tokens listed in id order.
    ///
    /// Returns `None` if the list contains a duplicate.
    pub fn from_tokens(tokens: Vec<String>) -> Option<Self> {
        let mut ids = AHashMap::with_capacity(tokens.len());
        for (id, token) in tokens.iter().enumerate() {
            if ids.insert(token.clone(), token_id(id).ok()?).is_some() {
                return None;
            }
        }
        Some(VocabularyIndex { ids, tokens })
    }
}

fn token_id(index: usize) -> crate::error::Result<TokenId> {
    TokenId::try_from(index).map_err(|_| {
        LexstatError::other(format!(
            "Vocabulary is full: at most {} distinct tokens",
            u64::from(TokenId::MAX) + 1
        ))
    })
}

// Only the id-ordered token list is stored; the map is rebuilt on load.
impl Serialize for VocabularyIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tokens.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VocabularyIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tokens = Vec::<String>::deserialize(deserializer)?;
        VocabularyIndex::from_tokens(tokens)
            .ok_or_else(|| serde::de::Error::custom("duplicate token in vocabulary"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let mut vocab = VocabularyIndex::new();
        for token in ["b", "a", "m", "b", "a"] {
            vocab.intern(token).unwrap();
        }

        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.get("b"), Some(0));
        assert_eq!(vocab.get("a"), Some(1));
        assert_eq!(vocab.get("m"), Some(2));
        assert_eq!(vocab.get("z"), None);
        assert_eq!(vocab.tokens(), &["b", "a", "m"]);
    }

    #[test]
    fn test_case_sensitive() {
        let mut vocab = VocabularyIndex::new();
        assert_ne!(vocab.intern("The").unwrap(), vocab.intern("the").unwrap());
        assert!(vocab.contains("The"));
        assert!(!vocab.contains("THE"));
    }

    #[test]
    fn test_reverse_lookup() {
        let mut vocab = VocabularyIndex::new();
        let id = vocab.intern("corpus").unwrap();
        assert_eq!(vocab.lookup(id), Some("corpus"));
        assert_eq!(vocab.lookup(id + 1), None);

        let pairs: Vec<_> = vocab.iter().collect();
        assert_eq!(pairs, vec![(0, "corpus")]);
    }

    #[test]
    fn test_from_tokens_rejects_duplicates() {
        assert!(VocabularyIndex::from_tokens(vec!["a".into(), "a".into()]).is_none());

        let vocab = VocabularyIndex::from_tokens(vec!["x".into(), "y".into()]).unwrap();
        assert_eq!(vocab.get("y"), Some(1));
    }

    #[test]
    fn test_token_ids_do_not_wrap() {
        assert_eq!(token_id(0).unwrap(), 0);
        assert_eq!(token_id(TokenId::MAX as usize).unwrap(), TokenId::MAX);
        assert!(matches!(
            token_id(TokenId::MAX as usize + 1),
            Err(LexstatError::Other(_))
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut vocab = VocabularyIndex::new();
        vocab.intern("alpha").unwrap();
        vocab.intern("beta").unwrap();

        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"["alpha","beta"]"#);

        let restored: VocabularyIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, vocab);
    }
}
