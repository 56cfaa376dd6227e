//! Text processing for text-valued feature groups.
//!
//! - [`Tokenizer`]: splits a string into word and punctuation tokens
//! - [`NGram`] / [`NGramRef`]: owned and borrowed vocabulary keys

mod ngram;
mod tokenizer;

pub use ngram::{NGram, NGramKind, NGramRef};
pub use tokenizer::Tokenizer;
