//! Single-feature decision-tree growing core for an explainable
//! boosting engine.
//!
//! Given a pre-binned feature and a sampled training set carrying
//! per-instance residuals (and Newton denominators for classification),
//! the crate grows one small best-first regression tree per call and
//! emits the result as a [`delta::ModelDelta`]: division boundaries in
//! original bin IDs plus one leaf increment per class per cell, ready to
//! be added into the running additive model.
//!
//! Bin construction, sampling, residual computation, and the boosting
//! schedule all live upstream; one tree is built by one worker on a
//! [`cache::TrainingCache`] it owns exclusively for the duration of the
//! build.

pub mod cache;
pub mod data;
pub mod delta;
pub mod errors;
pub mod histogram;
pub mod node;
pub mod objective;
mod splitter;
mod tree;
pub mod train;
pub mod utils;

pub use cache::TrainingCache;
pub use data::{Feature, SampledSet};
pub use delta::ModelDelta;
pub use errors::EmberError;
pub use objective::{LogLoss, Objective, SquaredLoss};
pub use train::{train_single_dimensional, train_zero_dimensional};
