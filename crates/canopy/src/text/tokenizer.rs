//! Word tokenizer.

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::CharIndices;

use serde::{Deserialize, Serialize};

/// Splits text into tokens.
///
/// A token is either a maximal run of alphanumeric characters or a single
/// character that is neither alphanumeric nor whitespace. Whitespace only
/// separates tokens. With `lowercase` set, tokens containing uppercase
/// characters are lowercased (others are borrowed from the input).
///
/// ```
/// use canopy::text::Tokenizer;
///
/// let tokens: Vec<_> = Tokenizer::default().tokenize("Hello, World!").collect();
/// assert_eq!(tokens, ["hello", ",", "world", "!"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenizer {
    pub lowercase: bool,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self { lowercase: true }
    }
}

impl Tokenizer {
    /// Iterate over the tokens of `text`.
    pub fn tokenize<'a>(&self, text: &'a str) -> Tokens<'a> {
        Tokens {
            text,
            chars: text.char_indices().peekable(),
            lowercase: self.lowercase,
        }
    }
}

/// Iterator returned by [`Tokenizer::tokenize`].
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    lowercase: bool,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

        let (start, first) = self.chars.next()?;
        let mut end = start + first.len_utf8();
        let mut has_uppercase = first.is_uppercase();

        if first.is_alphanumeric() {
            while let Some((i, c)) = self.chars.next_if(|(_, c)| c.is_alphanumeric()) {
                has_uppercase |= c.is_uppercase();
                end = i + c.len_utf8();
            }
        }

        let token = &self.text[start..end];
        if self.lowercase && has_uppercase {
            Some(Cow::Owned(token.to_lowercase()))
        } else {
            Some(Cow::Borrowed(token))
        }
    }
}
