//! Feature Vector - Core data structure for model input
//!
//! Turns the sparse JSON mapping sent by agents into a dense, fixed-order
//! vector. Missing slots take the layout default; unknown keys are ignored.

use ndarray::{arr2, Array2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::layout::{feature_index, FEATURE_COUNT, FEATURE_DEFAULTS, FEATURE_LAYOUT};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("features must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("feature '{feature}' is not numeric: {value}")]
    NotNumeric { feature: String, value: String },
}

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Dense feature values in the order defined by FEATURE_LAYOUT
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Vector holding every slot's default
    pub fn defaults() -> Self {
        Self { values: FEATURE_DEFAULTS }
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        feature_index(name).and_then(|i| self.get(i))
    }

    /// Single-row matrix for the scaler and model
    pub fn to_row(&self) -> Array2<f64> {
        arr2(&[self.values])
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> Value {
        let named: Map<String, Value> = FEATURE_LAYOUT
            .iter()
            .zip(self.values.iter())
            .map(|(name, value)| (name.to_string(), Value::from(*value)))
            .collect();
        Value::Object(named)
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::defaults()
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Build a feature vector from a raw JSON mapping
pub fn extract(raw: &Value) -> Result<FeatureVector, FeatureError> {
    let map = as_feature_map(raw)?;
    let mut values = FEATURE_DEFAULTS;

    for (slot, name) in FEATURE_LAYOUT.iter().enumerate() {
        if let Some(value) = coerce(name, map.get(*name))? {
            values[slot] = value;
        }
    }

    Ok(FeatureVector { values })
}

/// Extract every sample into a batch matrix, preserving input order
pub fn extract_batch(samples: &[Value]) -> Result<Array2<f64>, FeatureError> {
    let vectors = samples
        .iter()
        .map(extract)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Array2::from_shape_fn((vectors.len(), FEATURE_COUNT), |(row, col)| {
        vectors[row].values[col]
    }))
}

pub fn as_feature_map(raw: &Value) -> Result<&Map<String, Value>, FeatureError> {
    raw.as_object()
        .ok_or_else(|| FeatureError::NotAnObject(json_type_name(raw)))
}

/// Interpret a single raw value as a number.
///
/// `Ok(None)` means "absent" (missing key or JSON null) and the caller
/// should fall back to the default.
pub fn coerce(feature: &str, value: Option<&Value>) -> Result<Option<f64>, FeatureError> {
    let not_numeric = |v: &Value| FeatureError::NotNumeric {
        feature: feature.to_string(),
        value: v.to_string(),
    };

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Some(v @ Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or_else(|| not_numeric(v)),
        Some(v @ Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or_else(|| not_numeric(v)),
        Some(v) => Err(not_numeric(v)),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
