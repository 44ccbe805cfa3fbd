//! # pcapwatch Detection
//!
//! Per-frame feature extraction into shared, window-scoped counters.

pub mod counters;
pub mod features;

pub use counters::{AggregationState, CounterSnapshot};
pub use features::{Extraction, FeatureExtractor, SSH_PORT};
