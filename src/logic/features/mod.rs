//! Features Module - Feature Extraction Engine
//!
//! Layout (schema) and extraction of the dense vector fed to the scaler.

pub mod layout;
pub mod vector;


// Re-export common types
pub use layout::{
    feature_index, feature_name, feature_names, layout_hash, validate_layout, LayoutInfo,
    LayoutMismatchError, FEATURE_COUNT, FEATURE_DEFAULTS, FEATURE_LAYOUT, FEATURE_VERSION,
};
pub use vector::{as_feature_map, coerce, extract, extract_batch, FeatureError, FeatureVector};
