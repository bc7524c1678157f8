//! Detector - model lifecycle and the predict/train protocol
//!
//! ```text
//!  raw JSON ──extract──▶ vector ──scaler──▶ scaled ──forest──▶ label + raw score
//!      │                                                          │
//!      └──────────────── explain (reason, suggestions) ◀──────────┘
//! ```
//!
//! The scaler and forest are fitted together and live in one immutable
//! [`FittedState`]. Readers clone the `Arc` and never see a half-swapped pair;
//! training is serialized by `train_lock` so the file on disk always matches
//! exactly one completed fit.

pub mod error;
pub mod storage;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::{Array2, ArrayView2};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logic::explain::{self, RawFeatures};
use crate::logic::features::{as_feature_map, extract, extract_batch, FEATURE_COUNT};
use crate::logic::model::{
    AnomalyModel, ForestConfig, IsolationForest, StandardScaler, ANOMALY_LABEL,
};

pub use error::{DetectorError, StorageError};
pub use storage::{load_model, save_model, PersistedModel, DEFAULT_MODEL_PATH};

/// Rows in the synthetic dataset used to seed a brand-new model
pub const REFERENCE_SAMPLES: usize = 100;

/// Raw score that maps to a normalized score of 0.5.
///
/// Forest scores sit in [-1, 0), so normalized scores land in roughly
/// (0.5, 0.73]. Recalibrate here if the model's score range changes.
pub const SCORE_MIDPOINT: f64 = 0.0;

// ============================================================================
// TYPES
// ============================================================================

/// Result of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_anomaly: bool,
    /// In (0, 1); higher is more anomalous
    pub score: f64,
    /// |raw score|
    pub confidence: f64,
    pub reason: String,
    pub suggestions: Vec<String>,
}

/// Scaler and model fitted on the same batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedState {
    pub scaler: StandardScaler,
    pub model: IsolationForest,
}

impl FittedState {
    /// Fit a fresh scaler on `batch`, then a fresh forest on the scaled batch
    pub fn fit(batch: ArrayView2<f64>, config: ForestConfig) -> Result<Self, DetectorError> {
        let mut scaler = StandardScaler::new();
        scaler.fit(batch)?;
        let scaled = scaler.transform(batch)?;

        let mut model = IsolationForest::new(config);
        model.fit(scaled.view())?;

        Ok(Self { scaler, model })
    }

    pub fn is_fitted(&self) -> bool {
        self.scaler.is_fitted() && self.model.is_fitted()
    }
}

/// Logistic squashing of the raw isolation score.
///
/// Strictly decreasing: a lower (more anomalous) raw score gives a value
/// closer to 1.
pub fn normalize_score(raw_score: f64) -> f64 {
    1.0 / (1.0 + (raw_score - SCORE_MIDPOINT).exp())
}

/// Standard-normal matrix with the layout's width
pub fn reference_dataset<R: Rng>(rows: usize, rng: &mut R) -> Array2<f64> {
    Array2::from_shape_fn((rows, FEATURE_COUNT), |_| {
        Distribution::<f64>::sample(&StandardNormal, &mut *rng)
    })
}

// ============================================================================
// DETECTOR
// ============================================================================

pub struct Detector {
    model_path: PathBuf,
    state: RwLock<Arc<FittedState>>,
    train_lock: Mutex<()>,
}

impl Detector {
    /// Load the model at `path`, or create, fit and persist a baseline one
    pub fn initialize(path: impl Into<PathBuf>, config: ForestConfig) -> Result<Self, DetectorError> {
        Self::initialize_with_rng(path, config, &mut rand::thread_rng())
    }

    pub fn initialize_with_rng<R: Rng>(
        path: impl Into<PathBuf>,
        config: ForestConfig,
        rng: &mut R,
    ) -> Result<Self, DetectorError> {
        let path = path.into();

        if path.exists() {
            tracing::info!(path = %path.display(), "Loading model");
            let persisted = load_model(&path)?;
            tracing::info!(
                n_estimators = persisted.state.model.n_estimators(),
                samples = persisted.state.scaler.n_samples_seen(),
                saved_at = persisted.saved_at,
                "Model loaded"
            );
            return Ok(Self::from_state(path, persisted.state));
        }

        tracing::info!(
            path = %path.display(),
            n_estimators = config.n_estimators,
            contamination = config.contamination,
            "No persisted model, creating baseline Isolation Forest"
        );
        let reference = reference_dataset(REFERENCE_SAMPLES, rng);
        let state = FittedState::fit(reference.view(), config)?;
        save_model(&state, &path).map_err(DetectorError::Persist)?;

        Ok(Self::from_state(path, state))
    }

    pub fn from_state(path: impl Into<PathBuf>, state: FittedState) -> Self {
        Self {
            model_path: path.into(),
            state: RwLock::new(Arc::new(state)),
            train_lock: Mutex::new(()),
        }
    }

    /// Current scaler/model pair
    pub fn snapshot(&self) -> Arc<FittedState> {
        self.state.read().clone()
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_fitted()
    }

    /// Score one raw feature mapping
    pub fn predict(&self, raw: &Value) -> Result<Verdict, DetectorError> {
        let map = as_feature_map(raw)?;
        let vector = extract(raw)?;
        tracing::debug!(features = %vector.to_log_entry(), "Scoring");
        let state = self.snapshot();

        let row = vector.to_row();
        let scaled = state.scaler.transform(row.view())?;
        let label = state.model.predict(scaled.view())?[0];
        let raw_score = state.model.score_samples(scaled.view())?[0];

        let score = normalize_score(raw_score);
        let is_anomaly = label == ANOMALY_LABEL;
        let explanation = explain::explain(&RawFeatures::new(map), is_anomaly, score);

        Ok(Verdict {
            is_anomaly,
            score,
            confidence: raw_score.abs(),
            reason: explanation.reason,
            suggestions: explanation.suggestions,
        })
    }

    /// Refit scaler and model on `samples` and persist the result.
    ///
    /// Returns the number of samples used.
    pub fn train(&self, samples: &[Value]) -> Result<usize, DetectorError> {
        if samples.is_empty() {
            return Err(DetectorError::EmptyBatch);
        }
        let batch = extract_batch(samples)?;

        let _guard = self.train_lock.lock();
        let config = self.snapshot().model.config().clone();
        let fitted = Arc::new(FittedState::fit(batch.view(), config)?);

        *self.state.write() = fitted.clone();

        save_model(&fitted, &self.model_path).map_err(|e| {
            tracing::error!(path = %self.model_path.display(), error = %e, "Retrained model not persisted");
            DetectorError::Persist(e)
        })?;

        tracing::info!(samples = samples.len(), "Model retrained");
        Ok(samples.len())
    }
}
