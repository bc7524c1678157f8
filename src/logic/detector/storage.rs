//! Model persistence
//!
//! One JSON document holds the scaler and the forest together, tagged with
//! the feature layout they were fitted under. Writes go to a sibling temp
//! file first and are renamed into place.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::StorageError;
use super::FittedState;
use crate::logic::features::{layout_hash, validate_layout, FEATURE_COUNT, FEATURE_VERSION};

/// Default model location, relative to the working directory
pub const DEFAULT_MODEL_PATH: &str = "models/baseline.json";

/// On-disk format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedModel {
    pub feature_version: u8,
    pub layout_hash: u32,
    /// Unix timestamp
    pub saved_at: i64,
    pub state: FittedState,
}

#[derive(Serialize)]
struct PersistedModelRef<'a> {
    feature_version: u8,
    layout_hash: u32,
    saved_at: i64,
    state: &'a FittedState,
}

/// Save model to disk, replacing any previous file atomically
pub fn save_model(state: &FittedState, path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let doc = PersistedModelRef {
        feature_version: FEATURE_VERSION,
        layout_hash: layout_hash(),
        saved_at: chrono::Utc::now().timestamp(),
        state,
    };
    let json = serde_json::to_vec(&doc)?;

    let tmp = temp_path(path);
    let written = write_synced(&tmp, &json).and_then(|_| fs::rename(&tmp, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    tracing::debug!(path = %path.display(), bytes = json.len(), "Model saved");
    Ok(())
}

/// Load model from disk with layout validation
pub fn load_model(path: &Path) -> Result<PersistedModel, StorageError> {
    let data = fs::read(path)?;
    let persisted: PersistedModel = serde_json::from_slice(&data)?;

    validate_persisted(&persisted)?;
    Ok(persisted)
}

pub fn validate_persisted(persisted: &PersistedModel) -> Result<(), StorageError> {
    validate_layout(persisted.feature_version, persisted.layout_hash)?;

    let scaler_width = persisted.state.scaler.n_features();
    let model_width = persisted.state.model.n_features();
    if scaler_width != FEATURE_COUNT || model_width != FEATURE_COUNT {
        return Err(StorageError::Corrupt(format!(
            "expected {} features, scaler has {}, model has {}",
            FEATURE_COUNT, scaler_width, model_width
        )));
    }

    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "model".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("models/baseline.json"));
        assert_eq!(tmp, PathBuf::from("models/baseline.json.tmp"));
    }
}
