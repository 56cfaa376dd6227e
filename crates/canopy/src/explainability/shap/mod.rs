//! SHAP value computation.
//!
//! - [`LinearExplainer`]: exact, closed form
//! - [`TreeExplainer`]: path-dependent TreeSHAP over node covers

mod linear_explainer;
mod path;
mod tree_explainer;
mod values;

pub use linear_explainer::LinearExplainer;
pub use tree_explainer::{TreeExplainer, MAX_EXPLAIN_DEPTH};
pub use values::ShapValues;
