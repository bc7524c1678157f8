//! Logic Module - Detection Engine
//!
//! ## Layout
//! - `features/` - Feature layout and extraction from raw agent reports
//! - `model/` - Scaler and Isolation Forest behind the `AnomalyModel` trait
//! - `explain/` - Heuristic reasons and remediation suggestions
//! - `detector/` - Model lifecycle, persistence, predict/train

pub mod features;
pub mod model;
pub mod explain;
pub mod detector;

pub use detector::{Detector, DetectorError, Verdict};
