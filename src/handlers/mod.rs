//! HTTP handlers

pub mod health;
pub mod predict;
pub mod train;
pub mod model_info;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::Value;

use crate::AppError;

/// Pull a required top-level key out of a JSON body.
///
/// A body that failed to parse is reported the same way as a missing key.
pub(crate) fn required_field(
    body: Result<Json<Value>, JsonRejection>,
    key: &str,
) -> Result<Value, AppError> {
    let missing = || AppError::BadRequest(format!("Missing {} in request", key));

    let Json(mut body) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        missing()
    })?;

    body.get_mut(key).map(Value::take).ok_or_else(missing)
}
