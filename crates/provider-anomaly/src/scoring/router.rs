use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use super::error::ScoringError;
use super::features::ProviderClaimInput;
use super::pipeline::AnomalyPipeline;
use super::registry::CategoryDimension;
use super::verdict::Verdict;

/// Router exposing scoring and label lookup endpoints.
pub fn scoring_router(pipeline: Arc<AnomalyPipeline>) -> Router {
    Router::new()
        .route("/api/v1/providers/score", post(score_handler))
        .route("/api/v1/categories/:dimension", get(categories_handler))
        .with_state(pipeline)
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub verdict: Verdict,
    pub display_score: String,
    pub summary: String,
    pub features: Vec<NamedFeature>,
}

#[derive(Debug, Serialize)]
pub struct NamedFeature {
    pub name: &'static str,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct CategoryEntry {
    pub code: u32,
    pub label: String,
}

/// Score request body. Numeric fields are taken as raw JSON so that strings,
/// integral floats and malformed values all reach the same validation.
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub provider: String,
    pub procedure: String,
    pub avg_covered_charges: Value,
    pub avg_total_payments: Value,
    pub total_discharge: Value,
}

impl TryFrom<ScoreRequest> for ProviderClaimInput {
    type Error = ScoringError;

    fn try_from(request: ScoreRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            avg_covered_charges: real_field("avg_covered_charges", &request.avg_covered_charges)?,
            avg_total_payments: real_field("avg_total_payments", &request.avg_total_payments)?,
            total_discharge: count_field("total_discharge", &request.total_discharge)?,
            provider: request.provider,
            procedure: request.procedure,
        })
    }
}

fn real_field(field: &'static str, raw: &Value) -> Result<f64, ScoringError> {
    let parsed = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| not_numeric(field, raw))
}

/// Accepts integers and integral floats such as `100.0`.
fn count_field(field: &'static str, raw: &Value) -> Result<i64, ScoringError> {
    if let Some(count) = raw.as_i64() {
        return Ok(count);
    }
    let value = real_field(field, raw)?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Ok(value as i64)
    } else {
        Err(not_numeric(field, raw))
    }
}

fn not_numeric(field: &'static str, raw: &Value) -> ScoringError {
    let value = match raw {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    ScoringError::InvalidNumericInput { field, value }
}

pub(crate) async fn score_handler(
    State(pipeline): State<Arc<AnomalyPipeline>>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let payload = json!({ "error": rejection.body_text() });
            return (rejection.status(), Json(payload)).into_response();
        }
    };

    let input = match ProviderClaimInput::try_from(request) {
        Ok(input) => input,
        Err(error) => {
            warn!(%error, "rejected scoring request");
            return scoring_error_response(error);
        }
    };

    match pipeline.evaluate(&input) {
        Ok(outcome) => {
            let body = ScoreResponse {
                display_score: outcome.verdict.display_score(),
                summary: outcome.verdict.summary(),
                features: outcome
                    .features
                    .named()
                    .map(|(name, value)| NamedFeature { name, value })
                    .collect(),
                verdict: outcome.verdict,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => scoring_error_response(error),
    }
}

pub(crate) async fn categories_handler(
    State(pipeline): State<Arc<AnomalyPipeline>>,
    Path(dimension): Path<String>,
) -> Response {
    let dimension = match dimension.parse::<CategoryDimension>() {
        Ok(dimension) => dimension,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::NOT_FOUND, Json(payload)).into_response();
        }
    };

    let entries: Vec<CategoryEntry> = pipeline
        .registry()
        .labels(dimension)
        .iter()
        .enumerate()
        .map(|(code, label)| CategoryEntry {
            code: code as u32,
            label: label.to_string(),
        })
        .collect();

    let payload = json!({ "dimension": dimension, "labels": entries });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) fn scoring_error_response(error: ScoringError) -> Response {
    match error {
        ScoringError::UnknownCategory {
            dimension,
            ref label,
            ref known_labels,
        } => {
            let payload = json!({
                "error": error.to_string(),
                "dimension": dimension,
                "label": label,
                "known_labels": known_labels,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        ScoringError::InvalidNumericInput { field, .. } => {
            let payload = json!({
                "error": error.to_string(),
                "field": field,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        ScoringError::UnknownCode { .. } => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        ScoringError::ModelInputMismatch { .. } | ScoringError::RegistryDrift { .. } => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
