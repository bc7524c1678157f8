use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::logic::features::coerce;

/// Human-readable explanation attached to a verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub reason: String,
    pub suggestions: Vec<String>,
}

/// Read-only view over the unscaled request mapping.
///
/// Rules look at what the agent actually sent, including fields that are
/// not part of the feature layout such as `process_name`.
#[derive(Debug, Clone, Copy)]
pub struct RawFeatures<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> RawFeatures<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// Numeric value of `key`, 0 when absent or not numeric
    pub fn number(&self, key: &str) -> f64 {
        coerce(key, self.map.get(key))
            .ok()
            .flatten()
            .unwrap_or(0.0)
    }

    pub fn process_name(&self) -> Option<&'a str> {
        self.map.get("process_name").and_then(Value::as_str)
    }
}

/// Render a count the way an operator expects to read it (`3`, not `3.0`)
pub fn display_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
