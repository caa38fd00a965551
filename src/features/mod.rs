//! Features Module - per-step feature construction for breath cycles

pub mod builder;
pub mod layout;

pub use builder::{build_breath_features, FeatureMatrix};
pub use layout::{layout_hash, LayoutInfo, FEATURE_COUNT, FEATURE_LAYOUT};
