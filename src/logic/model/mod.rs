//! Model Module - Anomaly scoring capability
//!
//! The detector only talks to the model through [`AnomalyModel`], so the
//! scoring ensemble can be swapped without touching the predict/train
//! protocol. [`IsolationForest`] is the shipped implementation.

pub mod forest;
pub mod scaler;

use ndarray::{Array1, ArrayView2};

pub use forest::{ForestConfig, IsolationForest, MaxSamples};
pub use scaler::StandardScaler;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("model is not fitted")]
    NotFitted,

    #[error("cannot fit on an empty batch")]
    EmptyInput,

    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

// ============================================================================
// LABELS
// ============================================================================

/// Label returned by `predict` for anomalous samples
pub const ANOMALY_LABEL: i32 = -1;

/// Label returned by `predict` for normal samples
pub const NORMAL_LABEL: i32 = 1;

// ============================================================================
// ANOMALY MODEL TRAIT
// ============================================================================

/// Unsupervised anomaly scorer over a standardized feature matrix
pub trait AnomalyModel: Send + Sync {
    /// Fit on a batch (rows = samples), replacing any previous fit
    fn fit(&mut self, x: ArrayView2<f64>) -> Result<(), ModelError>;

    /// Per-sample score; lower means more anomalous
    fn score_samples(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError>;

    /// Per-sample label: [`ANOMALY_LABEL`] or [`NORMAL_LABEL`]
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<i32>, ModelError>;

    /// Score below which a sample is labelled anomalous
    fn threshold(&self) -> f64;

    fn is_fitted(&self) -> bool;
}
