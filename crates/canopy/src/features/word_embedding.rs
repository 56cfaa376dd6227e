//! Word embedding feature group.

use indexmap::IndexSet;
use ndarray::{Array2, ArrayView1};

use crate::input::PredictInput;
use crate::text::Tokenizer;

/// Fixed embedding table: one row of `size` values per known word.
#[derive(Debug, Clone, PartialEq)]
pub struct WordEmbeddingModel {
    words: IndexSet<String>,
    values: Array2<f32>,
}

impl WordEmbeddingModel {
    /// Build from words and a row-major value buffer of `words.len() * size` values.
    ///
    /// Returns `None` if the table is empty, the buffer length does not match
    /// or a word repeats.
    pub fn new(words: Vec<String>, size: usize, values: Vec<f32>) -> Option<Self> {
        let n_words = words.len();
        if n_words == 0 || size == 0 {
            return None;
        }
        let words: IndexSet<String> = words.into_iter().collect();
        if words.len() != n_words {
            return None;
        }
        let values = Array2::from_shape_vec((n_words, size), values).ok()?;
        Some(Self { words, values })
    }

    /// Embedding dimension.
    pub fn size(&self) -> usize {
        self.values.ncols()
    }

    pub fn words(&self) -> impl ExactSizeIterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// Embedding row for `word`.
    pub fn get(&self, word: &str) -> Option<ArrayView1<'_, f32>> {
        self.words
            .get_index_of(word)
            .map(|index| self.values.row(index))
    }

    /// Row-major copy of the table.
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }
}

/// Mean-pools the embeddings of a text column's tokens.
///
/// Tokens outside the embedding vocabulary are skipped; if none match,
/// every dimension is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct WordEmbeddingFeatureGroup {
    pub source_column_name: String,
    pub tokenizer: Tokenizer,
    pub model: WordEmbeddingModel,
}

impl WordEmbeddingFeatureGroup {
    pub fn n_features(&self) -> usize {
        self.model.size()
    }

    pub(crate) fn compute(&self, input: &PredictInput, out: &mut [f32]) {
        out.fill(0.0);
        let Some(text) = input.text(&self.source_column_name) else {
            return;
        };
        let mut found = 0usize;
        for token in self.tokenizer.tokenize(&text) {
            if let Some(row) = self.model.get(&token) {
                out.iter_mut().zip(row).for_each(|(o, &v)| *o += v);
                found += 1;
            }
        }
        if found > 0 {
            let n = found as f32;
            out.iter_mut().for_each(|o| *o /= n);
        }
    }
}
