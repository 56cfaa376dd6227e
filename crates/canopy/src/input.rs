//! Raw prediction input records.
//!
//! A [`PredictInput`] maps column names to loosely typed values. Feature groups
//! coerce values into the family they need; a value of the wrong family is
//! treated as missing rather than rejected.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single input value.
///
/// Serialized untagged, so JSON `1.5`, `"red"` and `true` map directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictInputValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl PredictInputValue {
    /// Coerce to a finite number.
    ///
    /// Numbers pass through and numeric strings are parsed. Non-finite values,
    /// unparsable strings and booleans yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => *value,
            Self::String(value) => value.trim().parse::<f64>().ok()?,
            Self::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Coerce to a categorical or text value.
    ///
    /// Strings are borrowed, booleans become `"true"` / `"false"`, numbers yield `None`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(value) => Some(Cow::Borrowed(value.as_str())),
            Self::Bool(true) => Some(Cow::Borrowed("true")),
            Self::Bool(false) => Some(Cow::Borrowed("false")),
            Self::Number(_) => None,
        }
    }

    /// Short name of the value family, for diagnostics.
    pub fn family(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PredictInputValue {
                fn from(value: $ty) -> Self {
                    Self::Number(f64::from(value))
                }
            }
        )*
    };
}

impl_from_number!(f64, f32, i32, u32, i16, u16, i8, u8);

impl From<bool> for PredictInputValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for PredictInputValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for PredictInputValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// One input record: column name to value.
///
/// Columns the model does not use are ignored; columns the model uses but the
/// record lacks take their feature group's baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictInput(pub BTreeMap<String, PredictInputValue>);

impl PredictInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning `self` for chaining.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<PredictInputValue>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<PredictInputValue>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&PredictInputValue> {
        self.0.get(column)
    }

    /// Numeric value of `column`, or `None` when missing or of the wrong family.
    pub(crate) fn number(&self, column: &str) -> Option<f64> {
        let value = self.0.get(column)?;
        let number = value.as_number();
        if number.is_none() {
            log::debug!(
                "column {column:?}: {} value is not numeric, treating as missing",
                value.family()
            );
        }
        number
    }

    /// Text value of `column`, or `None` when missing or of the wrong family.
    pub(crate) fn text(&self, column: &str) -> Option<Cow<'_, str>> {
        let value = self.0.get(column)?;
        let text = value.as_text();
        if text.is_none() {
            log::debug!(
                "column {column:?}: {} value is not text, treating as missing",
                value.family()
            );
        }
        text
    }
}

impl<K, V> FromIterator<(K, V)> for PredictInput
where
    K: Into<String>,
    V: Into<PredictInputValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
