//! Webhook endpoints for channel integrations

use std::sync::Arc;

use axum::{Router, routing::post};

use super::ApiState;

pub mod line;

/// Build webhooks router
///
/// The LINE endpoint is served at both `/webhook` and `/api/webhook` so the
/// same channel settings work for a standalone server and a serverless deploy.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/webhook", post(line::handle_webhook))
        .route("/api/webhook", post(line::handle_webhook))
        .with_state(state)
}
