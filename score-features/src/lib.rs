//! Feature extraction and multi-chain aggregation.

#![forbid(unsafe_code)]

pub mod aggregator;
pub mod extractor;
pub mod model;

pub use extractor::{extract_features, ExtractionReport};
pub use model::{FeatureRecord, FeatureVector, MultiChainFeatureVector};
