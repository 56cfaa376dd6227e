//! N-gram vocabulary keys.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::Equivalent;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::Tokenizer;

/// Kind of an n-gram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NGramKind {
    Unigram,
    Bigram,
}

/// An owned n-gram, used as a vocabulary key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NGram {
    Unigram(String),
    Bigram(String, String),
}

/// A borrowed n-gram produced while scanning text.
///
/// Hashes identically to the equal [`NGram`], so vocabularies can be probed
/// without allocating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NGramRef<'a> {
    Unigram(Cow<'a, str>),
    Bigram(Cow<'a, str>, Cow<'a, str>),
}

impl NGram {
    pub fn kind(&self) -> NGramKind {
        match self {
            Self::Unigram(_) => NGramKind::Unigram,
            Self::Bigram(_, _) => NGramKind::Bigram,
        }
    }
}

impl Hash for NGram {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Unigram(token) => {
                0u8.hash(state);
                token.as_str().hash(state);
            }
            Self::Bigram(a, b) => {
                1u8.hash(state);
                a.as_str().hash(state);
                b.as_str().hash(state);
            }
        }
    }
}

impl Hash for NGramRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Unigram(token) => {
                0u8.hash(state);
                token.as_ref().hash(state);
            }
            Self::Bigram(a, b) => {
                1u8.hash(state);
                a.as_ref().hash(state);
                b.as_ref().hash(state);
            }
        }
    }
}

impl Equivalent<NGram> for NGramRef<'_> {
    fn equivalent(&self, key: &NGram) -> bool {
        match (self, key) {
            (Self::Unigram(a), NGram::Unigram(b)) => a.as_ref() == b.as_str(),
            (Self::Bigram(a0, a1), NGram::Bigram(b0, b1)) => {
                a0.as_ref() == b0.as_str() && a1.as_ref() == b1.as_str()
            }
            _ => false,
        }
    }
}

impl fmt::Display for NGram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unigram(token) => write!(f, "{token}"),
            Self::Bigram(a, b) => write!(f, "{a} {b}"),
        }
    }
}

impl Tokenizer {
    /// Iterate the unigrams of `text`, followed by its bigrams when `bigrams` is set.
    pub fn ngrams<'a>(
        &'a self,
        text: &'a str,
        bigrams: bool,
    ) -> impl Iterator<Item = NGramRef<'a>> + 'a {
        let unigrams = self.tokenize(text).map(NGramRef::Unigram);
        let pairs = bigrams
            .then(|| {
                self.tokenize(text)
                    .tuple_windows()
                    .map(|(a, b)| NGramRef::Bigram(a, b))
            })
            .into_iter()
            .flatten();
        unigrams.chain(pairs)
    }
}
