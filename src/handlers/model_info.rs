//! Model metadata handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::logic::features::LayoutInfo;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    #[serde(rename = "type")]
    model_type: &'static str,
    features: Vec<String>,
    n_estimators: usize,
    contamination: f64,
    model_path: String,
    feature_version: u8,
    layout_hash: u32,
    training_samples: usize,
}

pub async fn info(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    let fitted = state.detector.snapshot();
    let layout = LayoutInfo::current();

    Json(ModelInfoResponse {
        model_type: "IsolationForest",
        features: layout.feature_names,
        n_estimators: fitted.model.n_estimators(),
        contamination: fitted.model.contamination(),
        model_path: state.detector.model_path().display().to_string(),
        feature_version: layout.version,
        layout_hash: layout.hash,
        training_samples: fitted.scaler.n_samples_seen(),
    })
}
