mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Json, State};
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use mentor_agents::{ChatTurnController, SubmitOutcome, TurnOutcome};
use mentor_core::{
    amount_or_zero, compute_metrics, evaluate_budget, BudgetRecord, ChatInput, ProfileType,
};
use mentor_observability::AppMetrics;
use mentor_storage::MemoryStore;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::rate_limit::CallerThrottle;

#[derive(Clone)]
pub struct ApiState {
    pub controller: Arc<ChatTurnController<MemoryStore>>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub throttle: CallerThrottle,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: mentor_observability::MetricsSnapshot,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatRequest {
    session_id: Option<String>,
    text: String,
    profile: Option<String>,
}

/// Budget fields arrive as raw form strings; anything non-numeric collapses
/// to zero before the engines run.
#[derive(Debug, Clone, Deserialize)]
struct AnalyzeRequest {
    profile: String,
    #[serde(default)]
    income: String,
    #[serde(default)]
    housing: String,
    #[serde(default)]
    food: String,
    #[serde(default)]
    transportation: String,
    #[serde(default)]
    entertainment: String,
    #[serde(default)]
    utilities: String,
    #[serde(default)]
    other: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ProfileUpsertRequest {
    session_id: Option<String>,
    profile: String,
}

pub fn build_app() -> Router {
    let metrics = AppMetrics::shared();
    let store = Arc::new(MemoryStore::new());

    let latency = Duration::from_millis(
        env::var("MENTOR_CHAT_LATENCY_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(1000),
    );
    let controller = Arc::new(
        ChatTurnController::new(store, metrics.clone()).with_latency(latency),
    );

    let api_key = env::var("MENTOR_API_KEY").unwrap_or_else(|_| "dev-mentor-key".to_string());
    let rate_limit_window = Duration::from_secs(
        env::var("MENTOR_API_RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(60),
    );
    let rate_limit_max = env::var("MENTOR_API_RATE_LIMIT_MAX")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(80);

    let state = ApiState {
        controller,
        metrics,
        api_key,
        throttle: CallerThrottle::new(rate_limit_window, rate_limit_max),
    };

    build_router(state)
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat", post(chat))
        .route("/v1/chat/submit", post(chat_submit))
        .route("/v1/budget/analyze", post(budget_analyze))
        .route("/v1/profile/upsert", post(profile_upsert))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn chat(State(state): State<ApiState>, Json(input): Json<ChatRequest>) -> Response {
    let outcome = state
        .controller
        .handle_turn(ChatInput {
            session_id: input.session_id,
            text: input.text,
            profile: input.profile,
        })
        .await;

    match outcome {
        Ok(TurnOutcome::Completed(reply)) => (StatusCode::OK, Json(reply)).into_response(),
        Ok(TurnOutcome::Rejected(rejection)) => rejection_response(rejection),
        Err(error) => internal_error(error),
    }
}

async fn chat_submit(State(state): State<ApiState>, Json(input): Json<ChatRequest>) -> Response {
    let profile = ProfileType::from_optional_str(input.profile.as_deref());
    let outcome = state
        .controller
        .submit(input.session_id.as_deref(), profile, &input.text)
        .await;

    match outcome {
        Ok(SubmitOutcome::Accepted {
            session_id,
            user_message,
        }) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "accepted": true,
                "session_id": session_id,
                "user_message": user_message,
            })),
        )
            .into_response(),
        Ok(rejection) => rejection_response(rejection),
        Err(error) => internal_error(error),
    }
}

async fn budget_analyze(
    State(state): State<ApiState>,
    Json(input): Json<AnalyzeRequest>,
) -> Response {
    let Some(profile) = ProfileType::from_optional_str(Some(&input.profile)) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "invalid_profile",
                "message": "profile must be 'student' or 'professional'"
            })),
        )
            .into_response();
    };

    let record = BudgetRecord {
        income: amount_or_zero(&input.income),
        housing: amount_or_zero(&input.housing),
        food: amount_or_zero(&input.food),
        transportation: amount_or_zero(&input.transportation),
        entertainment: amount_or_zero(&input.entertainment),
        utilities: amount_or_zero(&input.utilities),
        other: amount_or_zero(&input.other),
    }
    .sanitized();

    let metrics = compute_metrics(&record);
    let recommendations = evaluate_budget(&metrics, profile);
    state.metrics.inc_analysis();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "profile": profile,
            "metrics": metrics,
            "recommendations": recommendations,
        })),
    )
        .into_response()
}

async fn profile_upsert(
    State(state): State<ApiState>,
    Json(input): Json<ProfileUpsertRequest>,
) -> Response {
    let Some(profile) = ProfileType::from_optional_str(Some(&input.profile)) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "invalid_profile",
                "message": "profile must be 'student' or 'professional'"
            })),
        )
            .into_response();
    };

    match state
        .controller
        .set_profile_once(input.session_id.as_deref(), profile)
        .await
    {
        Ok(session) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "session_id": session.session_id,
                "profile": session.profile,
            })),
        )
            .into_response(),
        Err(error) => internal_error(error),
    }
}

/// Rejections are no-ops by contract, so they answer 200 with a reason
/// rather than an error status.
fn rejection_response(rejection: SubmitOutcome) -> Response {
    let payload = match rejection {
        SubmitOutcome::RejectedEmpty => serde_json::json!({
            "accepted": false,
            "reason": "empty_submission",
        }),
        SubmitOutcome::RejectedTurnInFlight { session_id } => serde_json::json!({
            "accepted": false,
            "reason": "turn_in_flight",
            "session_id": session_id,
        }),
        SubmitOutcome::Accepted { .. } => serde_json::json!({ "accepted": true }),
    };
    (StatusCode::OK, Json(payload)).into_response()
}

fn internal_error(error: anyhow::Error) -> Response {
    tracing::error!(error = %error, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "internal_error" })),
    )
        .into_response()
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());
    if presented != Some(state.api_key.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "invalid_api_key" })),
        )
            .into_response();
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let caller = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .unwrap_or("local")
        .trim()
        .to_string();

    if !state.throttle.try_acquire(&caller) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "error": "rate_limited" })),
        )
            .into_response();
    }

    next.run(request).await
}
