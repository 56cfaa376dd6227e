//! One-hot encoded feature group.

use indexmap::IndexSet;

use crate::input::PredictInput;

/// Encodes a categorical column as one indicator per known variant.
///
/// Unknown and missing values produce the all-zero vector. Booleans are
/// matched against the variants `"true"` and `"false"`.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncodedFeatureGroup {
    pub source_column_name: String,
    variants: IndexSet<String>,
}

impl OneHotEncodedFeatureGroup {
    /// Duplicate variants collapse onto their first occurrence.
    pub fn new<I, S>(source_column_name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source_column_name: source_column_name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Variants in feature order.
    pub fn variants(&self) -> impl ExactSizeIterator<Item = &str> {
        self.variants.iter().map(String::as_str)
    }

    pub fn n_features(&self) -> usize {
        self.variants.len()
    }

    /// Feature index of `value`, if it is a known variant.
    pub fn variant_index(&self, value: &str) -> Option<usize> {
        self.variants.get_index_of(value)
    }

    pub(crate) fn compute(&self, input: &PredictInput, out: &mut [f32]) {
        out.fill(0.0);
        let index = input
            .text(&self.source_column_name)
            .and_then(|value| self.variant_index(&value));
        if let Some(index) = index {
            out[index] = 1.0;
        }
    }
}
