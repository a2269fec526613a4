//! Expense prediction handlers
//!
//! Training and prediction refusals are reported as 400 with
//! `{success: false, ...}`; anything else is an internal error.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::{AppError, AppState};
use spendcast_core::forecast::engine::{
    training_failure_message, INCOME_REQUIRED_MESSAGE, INVALID_INCOME_MESSAGE, TRAINED_MESSAGE,
};
use spendcast_core::models::{CategoryInsight, PredictionModel};
use spendcast_core::{FailureReason, Prediction};

/// Response for a training request
#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<usize>,
}

/// Successful prediction body
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    #[serde(flatten)]
    pub prediction: Prediction,
}

/// Refused prediction body
#[derive(Debug, Serialize)]
pub struct PredictFailure {
    pub success: bool,
    pub reason: FailureReason,
    pub message: String,
}

impl PredictFailure {
    fn validation(message: &str) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(Self {
                success: false,
                reason: FailureReason::ValidationError,
                message: message.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub success: bool,
    pub insights: Vec<CategoryInsight>,
}

#[derive(Debug, Serialize)]
pub struct ModelStatusResponse {
    pub trained: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<PredictionModel>,
    pub backend: String,
}

/// POST /api/users/:user_id/predictions/train - Train on the last window of ledger data
pub async fn train_model(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    match state.forecaster.train(user_id) {
        Ok(summary) => {
            info!(user_id, samples = summary.samples, "Model trained via API");
            Ok(Json(TrainResponse {
                success: true,
                message: TRAINED_MESSAGE.to_string(),
                samples: Some(summary.samples),
            })
            .into_response())
        }
        Err(err) => match training_failure_message(&err) {
            Some(message) => Ok((
                StatusCode::BAD_REQUEST,
                Json(TrainResponse {
                    success: false,
                    message: message.to_string(),
                    samples: None,
                }),
            )
                .into_response()),
            None => Err(err.into()),
        },
    }
}

/// POST /api/users/:user_id/predictions/expenses - Predict expenses for `{"income": n}`
pub async fn predict_expenses(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Ok(Json(body)) = body else {
        return Ok(PredictFailure::validation(INCOME_REQUIRED_MESSAGE));
    };

    let income = match body.get("income") {
        None | Some(Value::Null) => return Ok(PredictFailure::validation(INCOME_REQUIRED_MESSAGE)),
        Some(value) => match parse_income(value) {
            Some(income) => income,
            None => return Ok(PredictFailure::validation(INVALID_INCOME_MESSAGE)),
        },
    };

    match state.forecaster.predict(user_id, income) {
        Ok(prediction) => Ok(Json(PredictResponse {
            success: true,
            prediction,
        })
        .into_response()),
        Err(err) => match FailureReason::of(&err) {
            Some(reason) => Ok((
                StatusCode::BAD_REQUEST,
                Json(PredictFailure {
                    success: false,
                    reason,
                    message: reason.message(&err),
                }),
            )
                .into_response()),
            None => Err(err.into()),
        },
    }
}

/// Accept a JSON number or a numeric string
fn parse_income(value: &Value) -> Option<f64> {
    let income = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (income.is_finite() && income >= 0.0).then_some(income)
}

/// GET /api/users/:user_id/predictions/insights - All stored category insights
pub async fn list_insights(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<InsightsResponse>, AppError> {
    let insights = state.forecaster.list_insights(user_id)?;
    Ok(Json(InsightsResponse {
        success: true,
        insights,
    }))
}

/// GET /api/users/:user_id/predictions/model - Live model metadata
pub async fn model_status(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<ModelStatusResponse>, AppError> {
    if state.db.get_user(user_id)?.is_none() {
        return Err(AppError::not_found("User not found"));
    }

    let model = state.forecaster.model_status(user_id)?;
    Ok(Json(ModelStatusResponse {
        trained: model.is_some(),
        model,
        backend: state.forecaster.store().backend_name().to_string(),
    }))
}
