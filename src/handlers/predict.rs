//! Prediction handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;

use super::required_field;
use crate::logic::detector::Verdict;
use crate::{AppResult, AppState};

/// Score one feature mapping
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Verdict>> {
    let features = required_field(body, "features")?;

    let verdict = state.detector.predict(&features)?;

    tracing::info!(
        is_anomaly = verdict.is_anomaly,
        score = verdict.score,
        "Prediction"
    );

    Ok(Json(verdict))
}
