//! Cosine similarity between the bag-of-words vectors of two text columns.

use crate::input::PredictInput;
use crate::text::Tokenizer;

use super::bag_of_words::{l2_normalize, BagOfWordsStrategy, Vocabulary};

/// Emits one feature: the cosine similarity of two columns' n-gram vectors.
///
/// Both vectors are weighted with the group's strategy over the shared
/// vocabulary. The similarity is 0 if either vector is all zero.
#[derive(Debug, Clone, PartialEq)]
pub struct BagOfWordsCosineSimilarityFeatureGroup {
    pub source_column_name_a: String,
    pub source_column_name_b: String,
    pub strategy: BagOfWordsStrategy,
    pub tokenizer: Tokenizer,
    pub vocabulary: Vocabulary,
}

impl BagOfWordsCosineSimilarityFeatureGroup {
    pub(crate) fn compute(&self, input: &PredictInput, out: &mut [f32]) {
        let mut a = vec![0.0; self.vocabulary.len()];
        let mut b = vec![0.0; self.vocabulary.len()];
        self.weigh(input, &self.source_column_name_a, &mut a);
        self.weigh(input, &self.source_column_name_b, &mut b);
        l2_normalize(&mut a);
        l2_normalize(&mut b);
        out[0] = a.iter().zip(&b).map(|(x, y)| x * y).sum();
    }

    fn weigh(&self, input: &PredictInput, column: &str, out: &mut [f32]) {
        let text = input.text(column);
        self.vocabulary.weigh(
            &self.tokenizer,
            self.strategy,
            text.as_deref().unwrap_or(""),
            out,
        );
    }
}
