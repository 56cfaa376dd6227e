//! Bag-of-words feature group and the shared n-gram vocabulary.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::PredictInput;
use crate::text::{NGram, NGramKind, Tokenizer};

/// How a vocabulary entry's feature value is derived from its occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BagOfWordsStrategy {
    /// 1 if the n-gram occurs at least once.
    Present,
    /// Number of occurrences.
    Count,
    /// Occurrences weighted by inverse document frequency, then L2-normalized.
    #[default]
    TfIdf,
}

/// Ordered n-gram vocabulary with per-entry inverse document frequency.
///
/// Entry order defines feature order. Bigrams are only generated from the
/// input text when the vocabulary contains at least one.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    ngrams: IndexMap<NGram, f32>,
    has_bigrams: bool,
}

impl Vocabulary {
    /// Build from `(ngram, idf)` pairs. Duplicates keep the first position.
    pub fn new(entries: impl IntoIterator<Item = (NGram, f32)>) -> Self {
        let mut ngrams = IndexMap::new();
        for (ngram, idf) in entries {
            ngrams.entry(ngram).or_insert(idf);
        }
        let has_bigrams = ngrams.keys().any(|g| g.kind() == NGramKind::Bigram);
        Self {
            ngrams,
            has_bigrams,
        }
    }

    pub fn len(&self) -> usize {
        self.ngrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ngrams.is_empty()
    }

    /// N-grams with their idf, in feature order.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = (&NGram, f32)> {
        self.ngrams.iter().map(|(g, &idf)| (g, idf))
    }

    pub fn ngram(&self, index: usize) -> Option<&NGram> {
        self.ngrams.get_index(index).map(|(g, _)| g)
    }

    /// Write the weighted n-gram vector of `text` into `out` (length `len()`).
    pub fn weigh(
        &self,
        tokenizer: &Tokenizer,
        strategy: BagOfWordsStrategy,
        text: &str,
        out: &mut [f32],
    ) {
        debug_assert_eq!(out.len(), self.len());
        out.fill(0.0);
        for ngram in tokenizer.ngrams(text, self.has_bigrams) {
            let Some((index, _, &idf)) = self.ngrams.get_full(&ngram) else {
                continue;
            };
            match strategy {
                BagOfWordsStrategy::Present => out[index] = 1.0,
                BagOfWordsStrategy::Count => out[index] += 1.0,
                BagOfWordsStrategy::TfIdf => out[index] += idf,
            }
        }
        if strategy == BagOfWordsStrategy::TfIdf {
            l2_normalize(out);
        }
    }
}

/// Scale `values` to unit L2 norm. All-zero input is left unchanged.
pub(crate) fn l2_normalize(values: &mut [f32]) {
    let sum_of_squares: f64 = values.iter().map(|&v| f64::from(v) * f64::from(v)).sum();
    if sum_of_squares > 0.0 {
        let norm = sum_of_squares.sqrt() as f32;
        values.iter_mut().for_each(|v| *v /= norm);
    }
}

/// Encodes a text column as weighted n-gram occurrences over a vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct BagOfWordsFeatureGroup {
    pub source_column_name: String,
    pub strategy: BagOfWordsStrategy,
    pub tokenizer: Tokenizer,
    pub vocabulary: Vocabulary,
}

impl BagOfWordsFeatureGroup {
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub(crate) fn compute(&self, input: &PredictInput, out: &mut [f32]) {
        let text = input.text(&self.source_column_name);
        self.vocabulary.weigh(
            &self.tokenizer,
            self.strategy,
            text.as_deref().unwrap_or(""),
            out,
        );
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn unigrams(tokens: &[&str]) -> Vocabulary {
        Vocabulary::new(
            tokens
                .iter()
                .map(|t| (NGram::Unigram((*t).to_owned()), 1.0)),
        )
    }

    fn group(strategy: BagOfWordsStrategy, vocabulary: Vocabulary) -> BagOfWordsFeatureGroup {
        BagOfWordsFeatureGroup {
            source_column_name: "text".into(),
            strategy,
            tokenizer: Tokenizer::default(),
            vocabulary,
        }
    }

    fn compute(group: &BagOfWordsFeatureGroup, text: &str) -> Vec<f32> {
        let mut out = vec![f32::NAN; group.n_features()];
        group.compute(&PredictInput::new().with("text", text), &mut out);
        out
    }

    #[test]
    fn present_marks_known_unigrams() {
        let group = group(BagOfWordsStrategy::Present, unigrams(&["a", "b", "c"]));
        assert_eq!(compute(&group, "a b"), [1.0, 1.0, 0.0]);
        assert_eq!(compute(&group, "a a b"), [1.0, 1.0, 0.0]);
    }

    #[test]
    fn count_accumulates() {
        let group = group(BagOfWordsStrategy::Count, unigrams(&["a", "b", "c"]));
        assert_eq!(compute(&group, "A a b z"), [2.0, 1.0, 0.0]);
    }

    #[test]
    fn tfidf_is_unit_norm() {
        let vocabulary = Vocabulary::new([
            (NGram::Unigram("a".into()), 2.0),
            (NGram::Unigram("b".into()), 1.0),
            (NGram::Unigram("c".into()), 3.0),
        ]);
        let group = group(BagOfWordsStrategy::TfIdf, vocabulary);
        let out = compute(&group, "a b");
        let norm = (4.0f32 + 1.0).sqrt();
        assert_abs_diff_eq!(out[0], 2.0 / norm, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 1.0 / norm, epsilon = 1e-6);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn bigrams_only_when_vocabulary_has_them() {
        let vocabulary = Vocabulary::new([
            (NGram::Unigram("new".into()), 1.0),
            (NGram::Bigram("new".into(), "york".into()), 1.0),
        ]);
        let group = group(BagOfWordsStrategy::Count, vocabulary);
        assert_eq!(compute(&group, "New York new"), [2.0, 1.0]);
    }

    #[test]
    fn missing_text_is_zero() {
        let group = group(BagOfWordsStrategy::TfIdf, unigrams(&["a"]));
        let mut out = vec![f32::NAN];
        group.compute(&PredictInput::new(), &mut out);
        assert_eq!(out, [0.0]);
    }

    #[test]
    fn duplicate_entries_collapse() {
        let vocabulary = unigrams(&["a", "b", "a"]);
        assert_eq!(vocabulary.len(), 2);
        assert_eq!(vocabulary.ngram(1), Some(&NGram::Unigram("b".into())));
    }
}
