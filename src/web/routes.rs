use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use super::AppState;
use crate::db::count_posts;
use crate::pipeline::{BatchRequest, MAX_BATCH_SIZE};

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/stats", get(stats))
        .route("/api/generate", get(generate_usage).post(generate))
        .route("/api/cron/generate", post(cron_generate))
}

/// Structured error body returned for every rejected request.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

// ========== Generation ==========

/// Validate a batch request at the boundary: parse-then-trust.
fn validate_request(body: &BatchRequest) -> Result<(), String> {
    if body.count < 1 || body.count > MAX_BATCH_SIZE {
        return Err(format!(
            "count must be between 1 and {MAX_BATCH_SIZE}, got {}",
            body.count
        ));
    }
    if let Some(score) = body.min_seo_score {
        if score > 100 {
            return Err(format!("min_seo_score must be at most 100, got {score}"));
        }
    }
    Ok(())
}

async fn generate(
    State(state): State<AppState>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("invalid request body: {rejection}"),
            );
        }
    };

    if let Err(message) = validate_request(&request) {
        return error_response(StatusCode::BAD_REQUEST, message);
    }

    let report = state.pipeline.run_batch(&request).await;
    Json(report).into_response()
}

/// Usage document for the manual trigger endpoint.
async fn generate_usage(State(state): State<AppState>) -> Response {
    Json(json!({
        "endpoint": "/api/generate",
        "method": "POST",
        "body": {
            "count": format!("required, 1..={MAX_BATCH_SIZE}"),
            "validate_seo": "optional bool",
            "min_seo_score": "optional 0..=100",
        },
        "defaults": {
            "validate_seo": state.config.validate_seo,
            "min_seo_score": state.config.min_seo_score,
            "retry_attempts": state.config.retry_attempts,
        },
    }))
    .into_response()
}

/// Scheduler-triggered generation, guarded by a shared bearer secret.
async fn cron_generate(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(secret) = state.config.cron_secret.as_deref() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "cron endpoint disabled: CRON_SECRET is not configured",
        );
    };

    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret);

    if !authorized {
        return error_response(StatusCode::UNAUTHORIZED, "invalid or missing bearer token");
    }

    let count = usize::try_from(state.config.posts_per_day)
        .unwrap_or(1)
        .clamp(1, MAX_BATCH_SIZE);
    let request = BatchRequest {
        count,
        validate_seo: None,
        min_seo_score: None,
    };

    let report = state.pipeline.run_batch(&request).await;
    Json(report).into_response()
}

// ========== Health & statistics ==========

async fn health(State(state): State<AppState>) -> Response {
    let database_ok = count_posts(state.pipeline.database().pool()).await.is_ok();
    let generator_ok = state.pipeline.generator().health_probe().await;
    let healthy = database_ok && generator_ok;

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "healthy": healthy,
            "checks": {
                "database": database_ok,
                "generator": generator_ok,
            },
        })),
    )
        .into_response()
}

async fn stats(State(state): State<AppState>) -> Response {
    match state.pipeline.statistics().await {
        Ok(statistics) => Json(statistics).into_response(),
        Err(e) => {
            error!("Failed to read statistics: {e:#}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "database error")
        }
    }
}
