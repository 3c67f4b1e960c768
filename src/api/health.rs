//! Health check endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always "ok" while the process serves requests
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Detailed readiness response
#[derive(Serialize)]
pub struct ReadinessResponse {
    /// "ok" or "degraded"
    pub status: &'static str,
    /// Configured chat model, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Per-dependency results
    pub checks: ReadinessChecks,
}

/// Individual readiness checks
#[derive(Serialize)]
pub struct ReadinessChecks {
    /// LINE channel credentials
    pub line: CheckResult,
    /// Web search API key
    pub search: CheckResult,
}

/// Result of a single health check
#[derive(Serialize)]
pub struct CheckResult {
    /// "ok", "fail", or "unavailable"
    pub status: &'static str,
    /// Reason when not ok
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    const fn ok() -> Self {
        Self {
            status: "ok",
            message: None,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            status: "fail",
            message: Some(message.into()),
        }
    }

    fn unavailable() -> Self {
        Self {
            status: "unavailable",
            message: Some("not configured".to_string()),
        }
    }
}

/// Liveness probe - is the service running?
#[allow(clippy::unused_async)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe - can the service answer webhooks?
///
/// Missing LINE credentials fail readiness; a missing search key only
/// disables the web search tool.
#[allow(clippy::unused_async)]
async fn ready(State(state): State<Arc<ApiState>>) -> (StatusCode, Json<ReadinessResponse>) {
    let line = if state.line.is_some() {
        CheckResult::ok()
    } else {
        CheckResult::fail("LINE channel credentials missing")
    };
    let search = if state.search_enabled {
        CheckResult::ok()
    } else {
        CheckResult::unavailable()
    };

    let ready = line.status == "ok";
    let http_status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(ReadinessResponse {
            status: if ready { "ok" } else { "degraded" },
            model: state.model.clone(),
            checks: ReadinessChecks { line, search },
        }),
    )
}

/// Build health router (liveness only, no state needed)
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Build readiness router
pub fn ready_router(state: Arc<ApiState>) -> Router {
    Router::new().route("/ready", get(ready)).with_state(state)
}
