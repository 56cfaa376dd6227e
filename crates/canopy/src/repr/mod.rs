//! In-memory predictor representations.
//!
//! - [`gbdt`]: flattened decision trees and tree ensembles
//! - [`linear`]: per-output weight vectors with bias

pub mod gbdt;
pub mod linear;
