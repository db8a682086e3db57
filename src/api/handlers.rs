//! REST API request handlers.
//!
//! The handlers own the Router responsibilities from the design: they
//! validate that the required slots for each intent are present before
//! calling the engine, and they are the only place where internal error
//! kinds become HTTP status codes.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analytics::{AnalyticsEngine, Answer};
use crate::error::{AnalyticsError, SamarthError};
use crate::metrics::{get_metrics, Metrics};
use crate::parser::{parse_question, ParsedQuestion, QuestionIntent};

/// Application state shared across handlers.
pub struct ApiState {
    pub engine: Arc<AnalyticsEngine>,
}

impl ApiState {
    pub fn new(engine: Arc<AnalyticsEngine>) -> Self {
        Self { engine }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Ask request body.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Refresh response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub status: String,
}

// ============================================================================
// Dispatch
// ============================================================================

/// How a dispatched question failed.
#[derive(Debug)]
pub enum DispatchError {
    /// A required slot for the recognized intent is missing (client input).
    MissingParams(&'static str),
    /// The engine rejected the request as unanswerable with current data.
    Domain(AnalyticsError),
    /// Infrastructure failure.
    Internal(SamarthError),
}

/// Validate required slots for the parsed intent and invoke the matching
/// engine method. Shared by the HTTP handler and the CLI.
pub fn dispatch(engine: &AnalyticsEngine, parsed: &ParsedQuestion) -> Result<Answer, DispatchError> {
    let result = match &parsed.intent {
        QuestionIntent::CompareRainfallAndCrops {
            state_a,
            state_b,
            crop_filter,
            span,
            top_m,
        } => {
            let (Some(state_a), Some(state_b)) = (required(state_a), required(state_b)) else {
                return Err(DispatchError::MissingParams(
                    "Could not detect both states in the question.",
                ));
            };
            engine.compare_rainfall_and_crops(
                state_a,
                state_b,
                crop_filter.as_deref(),
                span.as_ref(),
                *top_m,
            )
        }
        QuestionIntent::DistrictExtremes {
            state_a,
            state_b,
            crop,
            year,
        } => {
            let (Some(state_a), Some(state_b), Some(crop)) =
                (required(state_a), required(state_b), required(crop))
            else {
                return Err(DispatchError::MissingParams(
                    "Missing states or crop in the question.",
                ));
            };
            engine.district_extremes(state_a, state_b, crop, *year)
        }
        QuestionIntent::ProductionTrendWithClimate { region, crop, span } => {
            let (Some(region), Some(crop)) = (required(region), required(crop)) else {
                return Err(DispatchError::MissingParams("Missing region or crop."));
            };
            engine.production_trend_with_climate(region, crop, span.as_ref())
        }
        QuestionIntent::PolicyArguments {
            region,
            crop_a,
            crop_b,
            span,
        } => {
            let (Some(region), Some(crop_a), Some(crop_b)) =
                (required(region), required(crop_a), required(crop_b))
            else {
                return Err(DispatchError::MissingParams(
                    "Need region and both crop types.",
                ));
            };
            engine.policy_arguments(region, crop_a, crop_b, span.as_ref())
        }
        QuestionIntent::Unknown { .. } => {
            get_metrics().questions_unknown_total.inc();
            return Ok(fallback_answer(parsed));
        }
    };

    result.map_err(|err| match err {
        SamarthError::Analytics(domain) => DispatchError::Domain(domain),
        other => DispatchError::Internal(other),
    })
}

/// Fixed fallback for questions matching no template.
fn fallback_answer(parsed: &ParsedQuestion) -> Answer {
    let mut debug = serde_json::Map::new();
    debug.insert(
        "intent".to_string(),
        serde_json::Value::from(parsed.intent.name()),
    );
    Answer {
        answer: "Sorry, I could not recognise that question pattern yet.".to_string(),
        tables: Vec::new(),
        citations: Vec::new(),
        debug: Some(debug),
    }
}

fn required(slot: &Option<String>) -> Option<&str> {
    slot.as_deref().filter(|s| !s.is_empty())
}

// ============================================================================
// Handler Functions
// ============================================================================

/// POST /ask - Answer a free-text question.
pub async fn ask_handler(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AskRequest>,
) -> impl IntoResponse {
    let metrics = get_metrics();
    metrics.questions_total.inc();
    let _ask_timer = Metrics::start_timer(&metrics.ask_duration_seconds);

    let parsed = {
        let _parse_timer = Metrics::start_timer(&metrics.parse_duration_seconds);
        parse_question(&request.question)
    };
    tracing::debug!(intent = parsed.intent.name(), "Question classified");

    match dispatch(&state.engine, &parsed) {
        Ok(answer) => (StatusCode::OK, Json(answer)).into_response(),
        Err(DispatchError::MissingParams(message)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: message.to_string(),
                code: "missing_parameters".to_string(),
            }),
        )
            .into_response(),
        Err(DispatchError::Domain(err)) => {
            metrics.question_domain_errors_total.inc();
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: err.to_string(),
                    code: "domain_error".to_string(),
                }),
            )
                .into_response()
        }
        Err(DispatchError::Internal(err)) => {
            tracing::error!("Question handling failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                    code: "internal_error".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /refresh - Reload the dataset snapshot.
pub async fn refresh_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.engine.refresh().await {
        Ok(()) => (
            StatusCode::OK,
            Json(RefreshResponse {
                status: "reloaded".to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Dataset refresh failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                    code: "refresh_failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health - Liveness probe.
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /metrics - Prometheus text exposition.
pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        get_metrics().export_prometheus(),
    )
}
