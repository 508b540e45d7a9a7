//! Payment gateway webhook handler.
//!
//! The gateway retries on any non-2xx, so only a malformed payload earns one
//! (the Json extractor rejects those before we run). Terminal conditions the
//! gateway cannot fix - expired session, tampered record - come back as 200
//! with an error code in the envelope so the retry loop stops.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use super::super::state::AppState;
use super::super::types::{ApiResponse, WebhookAck, error_codes};
use crate::session::{EngineError, GatewayEvent, WebhookOutcome};

/// Consume a gateway payment event
///
/// POST /api/v1/webhook/gateway
#[utoipa::path(
    post,
    path = "/api/v1/webhook/gateway",
    request_body = GatewayEvent,
    responses(
        (status = 200, description = "Event processed (including idempotent no-ops)", body = WebhookAck),
        (status = 400, description = "Malformed payload")
    ),
    tag = "Webhook"
)]
pub async fn gateway_webhook(
    State(state): State<Arc<AppState>>,
    Json(event): Json<GatewayEvent>,
) -> Json<ApiResponse<WebhookAck>> {
    match state.webhooks.handle(&event).await {
        Ok(outcome) => Json(ApiResponse::success(WebhookAck {
            status: outcome_label(&outcome).to_string(),
        })),
        Err(EngineError::ExpiredSession { .. }) => Json(ApiResponse::error(
            error_codes::SESSION_EXPIRED,
            "session expired before confirmation",
        )),
        Err(e @ EngineError::SignatureMismatch { .. }) => Json(ApiResponse::error(
            error_codes::SIGNATURE_MISMATCH,
            e.to_string(),
        )),
        Err(e) => Json(ApiResponse::error(error_codes::INTERNAL_ERROR, e.to_string())),
    }
}

fn outcome_label(outcome: &WebhookOutcome) -> &'static str {
    match outcome {
        WebhookOutcome::Ignored => "ignored",
        WebhookOutcome::UnknownReference => "unknown_reference",
        WebhookOutcome::Completed { .. } => "completed",
        WebhookOutcome::DispatchFailed => "dispatch_failed",
        WebhookOutcome::AlreadyProcessed => "already_processed",
        WebhookOutcome::Superseded { .. } => "superseded",
    }
}
