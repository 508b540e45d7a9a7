//! Operator-facing handlers: listing, detail, moderation actions.
//!
//! Authentication for the admin surface is handled upstream (reverse proxy /
//! session middleware); these handlers assume an authenticated operator.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};

use super::super::state::AppState;
use super::super::types::{
    AdminListParams, AdminListResponse, AdminSessionView, ApiError, ApiResult,
    ManualTransferRequest, ModerationResponse, RefundRequest, ResendNotificationRequest, ok,
};
use crate::session::{ListFilter, ModerationOutcome, SessionStatus};

/// List sessions for the moderation dashboard
///
/// GET /api/v1/admin/transactions
#[utoipa::path(
    get,
    path = "/api/v1/admin/transactions",
    params(AdminListParams),
    responses(
        (status = 200, description = "One page of sessions", body = AdminListResponse),
        (status = 400, description = "Unknown status filter")
    ),
    tag = "Admin"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AdminListParams>,
) -> ApiResult<AdminListResponse> {
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| {
            SessionStatus::from_str(s)
                .map_err(|_| ApiError::bad_request(format!("Unknown status: {}", s)))
        })
        .transpose()?;

    let page = state.query.list(&ListFilter {
        status,
        search: params.search,
        page: params.page,
        page_size: params.page_size,
    });

    ok(AdminListResponse {
        items: page.items.iter().map(AdminSessionView::from_session).collect(),
        total: page.total,
    })
}

/// Fetch one session by txn id
///
/// GET /api/v1/admin/transactions/{txn_id}
#[utoipa::path(
    get,
    path = "/api/v1/admin/transactions/{txn_id}",
    params(("txn_id" = String, Path, description = "Operator-facing transaction id")),
    responses(
        (status = 200, description = "Session detail", body = AdminSessionView),
        (status = 404, description = "Unknown txn id")
    ),
    tag = "Admin"
)]
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(txn_id): Path<String>,
) -> ApiResult<AdminSessionView> {
    let session = state
        .query
        .get(&txn_id)
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;
    ok(AdminSessionView::from_session(&session))
}

/// Hold a paid session for review (risk evaluation boundary)
///
/// POST /api/v1/admin/transactions/{txn_id}/flag
#[utoipa::path(
    post,
    path = "/api/v1/admin/transactions/{txn_id}/flag",
    params(("txn_id" = String, Path, description = "Operator-facing transaction id")),
    responses(
        (status = 200, description = "Session flagged", body = ModerationResponse),
        (status = 404, description = "Unknown txn id"),
        (status = 409, description = "Not in a flaggable state")
    ),
    tag = "Admin"
)]
pub async fn flag_transaction(
    State(state): State<Arc<AppState>>,
    Path(txn_id): Path<String>,
) -> ApiResult<ModerationResponse> {
    respond(state.moderation.flag(&txn_id)?)
}

/// Approve a flagged session
///
/// POST /api/v1/admin/transactions/{txn_id}/approve
#[utoipa::path(
    post,
    path = "/api/v1/admin/transactions/{txn_id}/approve",
    params(("txn_id" = String, Path, description = "Operator-facing transaction id")),
    responses(
        (status = 200, description = "Session approved", body = ModerationResponse),
        (status = 404, description = "Unknown txn id"),
        (status = 409, description = "Not flagged")
    ),
    tag = "Admin"
)]
pub async fn approve_transaction(
    State(state): State<Arc<AppState>>,
    Path(txn_id): Path<String>,
) -> ApiResult<ModerationResponse> {
    respond(state.moderation.approve(&txn_id)?)
}

/// Reject a flagged session
///
/// POST /api/v1/admin/transactions/{txn_id}/reject
#[utoipa::path(
    post,
    path = "/api/v1/admin/transactions/{txn_id}/reject",
    params(("txn_id" = String, Path, description = "Operator-facing transaction id")),
    responses(
        (status = 200, description = "Session rejected", body = ModerationResponse),
        (status = 404, description = "Unknown txn id"),
        (status = 409, description = "Not flagged")
    ),
    tag = "Admin"
)]
pub async fn reject_transaction(
    State(state): State<Arc<AppState>>,
    Path(txn_id): Path<String>,
) -> ApiResult<ModerationResponse> {
    respond(state.moderation.reject(&txn_id)?)
}

/// Record an out-of-band transfer for a failed session
///
/// POST /api/v1/admin/transactions/{txn_id}/manual-transfer
#[utoipa::path(
    post,
    path = "/api/v1/admin/transactions/{txn_id}/manual-transfer",
    params(("txn_id" = String, Path, description = "Operator-facing transaction id")),
    request_body = ManualTransferRequest,
    responses(
        (status = 200, description = "Session completed manually", body = ModerationResponse),
        (status = 400, description = "Missing transfer reference"),
        (status = 404, description = "Unknown txn id"),
        (status = 409, description = "Not failed")
    ),
    tag = "Admin"
)]
pub async fn manual_transfer(
    State(state): State<Arc<AppState>>,
    Path(txn_id): Path<String>,
    Json(req): Json<ManualTransferRequest>,
) -> ApiResult<ModerationResponse> {
    respond(
        state
            .moderation
            .manual_complete(&txn_id, &req.transfer_reference)?,
    )
}

/// Refund a completed or failed transfer
///
/// POST /api/v1/admin/transactions/{txn_id}/refund
#[utoipa::path(
    post,
    path = "/api/v1/admin/transactions/{txn_id}/refund",
    params(("txn_id" = String, Path, description = "Operator-facing transaction id")),
    request_body = RefundRequest,
    responses(
        (status = 200, description = "Session refunded", body = ModerationResponse),
        (status = 400, description = "Missing reason"),
        (status = 404, description = "Unknown txn id"),
        (status = 409, description = "Not refundable from current state")
    ),
    tag = "Admin"
)]
pub async fn refund_transaction(
    State(state): State<Arc<AppState>>,
    Path(txn_id): Path<String>,
    Json(req): Json<RefundRequest>,
) -> ApiResult<ModerationResponse> {
    respond(state.moderation.refund(&txn_id, &req.reason).await?)
}

/// Re-send the recipient notification
///
/// POST /api/v1/admin/transactions/{txn_id}/resend-notification
#[utoipa::path(
    post,
    path = "/api/v1/admin/transactions/{txn_id}/resend-notification",
    params(("txn_id" = String, Path, description = "Operator-facing transaction id")),
    request_body = ResendNotificationRequest,
    responses(
        (status = 200, description = "Notification queued", body = ModerationResponse),
        (status = 404, description = "Unknown txn id")
    ),
    tag = "Admin"
)]
pub async fn resend_notification(
    State(state): State<Arc<AppState>>,
    Path(txn_id): Path<String>,
    Json(req): Json<ResendNotificationRequest>,
) -> ApiResult<ModerationResponse> {
    respond(
        state
            .moderation
            .resend_notification(&txn_id, req.message.as_deref())
            .await?,
    )
}

fn respond(outcome: ModerationOutcome) -> ApiResult<ModerationResponse> {
    ok(ModerationResponse {
        txn_id: outcome.txn_id,
        status: outcome.status,
    })
}
