//! Linear predictor representation.

mod model;

pub use model::LinearModel;
