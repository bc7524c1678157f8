//! Training handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use super::required_field;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    status: &'static str,
    samples: usize,
    timestamp: String,
}

/// Refit the model on the supplied samples
pub async fn train(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<TrainResponse>> {
    let samples = match required_field(body, "training_data")? {
        Value::Array(samples) => samples,
        _ => return Err(AppError::BadRequest("training_data must be a list".to_string())),
    };

    tracing::info!(samples = samples.len(), "Training requested");

    // Fitting is CPU-bound; keep it off the async workers
    let detector = state.detector.clone();
    let samples = tokio::task::spawn_blocking(move || detector.train(&samples)).await??;

    Ok(Json(TrainResponse {
        status: "success",
        samples,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}
