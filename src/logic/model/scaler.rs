//! Standard Scaler - per-feature standardization
//!
//! Statistics come from the batch passed to `fit` and stay fixed until the
//! next `fit`; `transform` never looks at the batch it is transforming.

use ndarray::{aview1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::ModelError;

/// Scales below this are treated as zero variance
const MIN_SCALE: f64 = 10.0 * f64::EPSILON;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    var: Vec<f64>,
    scale: Vec<f64>,
    n_samples_seen: usize,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the statistics with those of `x`
    pub fn fit(&mut self, x: ArrayView2<f64>) -> Result<(), ModelError> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ModelError::EmptyInput);
        }

        let mean = x.mean_axis(Axis(0)).ok_or(ModelError::EmptyInput)?;
        let var = x.var_axis(Axis(0), 0.0);
        let scale = var.mapv(|v| {
            let s = v.sqrt();
            if s < MIN_SCALE { 1.0 } else { s }
        });

        *self = Self {
            mean: mean.to_vec(),
            var: var.to_vec(),
            scale: scale.to_vec(),
            n_samples_seen: x.nrows(),
        };
        Ok(())
    }

    /// `(x - mean) / scale` using the stored statistics
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, ModelError> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted);
        }
        if x.ncols() != self.mean.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.mean.len(),
                actual: x.ncols(),
            });
        }

        let mut out = x.to_owned();
        out -= &aview1(&self.mean);
        out /= &aview1(&self.scale);
        Ok(out)
    }

    pub fn is_fitted(&self) -> bool {
        !self.mean.is_empty()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn var(&self) -> &[f64] {
        &self.var
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }
}
