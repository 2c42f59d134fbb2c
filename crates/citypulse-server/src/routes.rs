//! API route handlers

use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use citypulse_core::{AnomalyVerdict, ForecastSeries, PulseError, Reading};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// PulseError mapped onto an HTTP response: caller-input problems are 422,
/// everything else surfaces as 500.
pub struct ApiError(PulseError);

impl From<PulseError> for ApiError {
    fn from(err: PulseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            PulseError::InvalidReading { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "citypulse-ml",
        "version": env!("CARGO_PKG_VERSION"),
        "model_trained": state.detector.is_trained(),
    }))
}

pub async fn detect(
    State(state): State<AppState>,
    Json(reading): Json<Reading>,
) -> Result<Json<AnomalyVerdict>, ApiError> {
    let verdict = state.detector.detect(&reading)?;
    Ok(Json(verdict))
}

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    pub horizon: Option<i64>,
}

impl ForecastParams {
    /// Negative horizons collapse to a single-point forecast.
    fn horizon_minutes(&self) -> u32 {
        self.horizon.unwrap_or(60).clamp(0, u32::MAX as i64) as u32
    }
}

pub async fn forecast_all(
    State(state): State<AppState>,
    Query(params): Query<ForecastParams>,
) -> Json<Vec<ForecastSeries>> {
    Json(state.forecaster.predict_all(params.horizon_minutes()))
}

pub async fn forecast_node(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    Query(params): Query<ForecastParams>,
) -> Json<ForecastSeries> {
    Json(
        state
            .forecaster
            .predict_node(&node_id, params.horizon_minutes()),
    )
}

pub async fn train(State(state): State<AppState>) -> Response {
    match state.detector.train() {
        Ok(()) => Json(serde_json::json!({
            "status": "success",
            "message": "Models trained"
        }))
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "training failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}
