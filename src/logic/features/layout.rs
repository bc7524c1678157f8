//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema**
//!
//! ## Rules:
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! Persisted models carry the version and layout hash; a model saved under
//! a different layout is refused at load time.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the vector
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Process (0) ===
    "process_frequency",     // 0: How often the process was seen in the window

    // === File / Network activity (1-3) ===
    "file_access_count",     // 1: File operations in the window
    "network_count",         // 2: Network connections in the window
    "sensitive_files",       // 3: Accesses to sensitive paths

    // === Time (4-5) ===
    "time_of_day",           // 4: Hour, 0-23
    "day_of_week",           // 5: 0-6

    // === Container (6) ===
    "container_age",         // 6: Seconds since container start
];

/// Value used when a slot is missing from the input mapping
pub const FEATURE_DEFAULTS: [f64; FEATURE_COUNT] = [
    0.0,  // process_frequency
    0.0,  // file_access_count
    0.0,  // network_count
    0.0,  // sensitive_files
    12.0, // time_of_day
    0.0,  // day_of_week
    0.0,  // container_age
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 7;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: feature_names(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when feature layout doesn't match expected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Feature layout mismatch: expected v{expected_version} (hash: {expected_hash:08x}), \
     got v{actual_version} (hash: {actual_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

/// Validate that incoming data matches current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

/// Feature names as owned strings, in layout order
pub fn feature_names() -> Vec<String> {
    FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_COUNT, 7);
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
        assert_eq!(FEATURE_DEFAULTS.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_layout_hash_consistency() {
        let hash1 = compute_layout_hash();
        let hash2 = compute_layout_hash();
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, 0);
    }

    #[test]
    fn test_validate_layout_success() {
        assert!(validate_layout(FEATURE_VERSION, layout_hash()).is_ok());
    }

    #[test]
    fn test_validate_layout_version_mismatch() {
        let err = validate_layout(FEATURE_VERSION + 1, layout_hash()).unwrap_err();
        assert_eq!(err.expected_version, FEATURE_VERSION);
        assert_eq!(err.actual_version, FEATURE_VERSION + 1);
    }

    #[test]
    fn test_validate_layout_hash_mismatch() {
        let result = validate_layout(FEATURE_VERSION, layout_hash().wrapping_add(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_feature_index() {
        assert_eq!(feature_index("process_frequency"), Some(0));
        assert_eq!(feature_index("sensitive_files"), Some(3));
        assert_eq!(feature_index("container_age"), Some(6));
        assert_eq!(feature_index("process_name"), None);
    }

    #[test]
    fn test_feature_name() {
        assert_eq!(feature_name(4), Some("time_of_day"));
        assert_eq!(feature_name(100), None);
    }

    #[test]
    fn test_time_of_day_defaults_to_noon() {
        let idx = feature_index("time_of_day").unwrap();
        assert_eq!(FEATURE_DEFAULTS[idx], 12.0);
    }
}
