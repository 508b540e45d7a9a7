//! Sender-facing handlers: session creation, payment-page view, checkout
//! initiation.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, InitiatePaymentRequest, InitiatePaymentResponse, SendRequest,
    SendResponse, TransactionView, TransactionViewParams, ok,
};
use crate::session::{CreateSessionRequest, SessionToken};

/// Create a transfer session
///
/// POST /api/v1/send
#[utoipa::path(
    post,
    path = "/api/v1/send",
    request_body = SendRequest,
    responses(
        (status = 200, description = "Session created", body = SendResponse),
        (status = 400, description = "Invalid amount or account number")
    ),
    tag = "Send"
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendRequest>,
) -> ApiResult<SendResponse> {
    let (token, txn_id) = state.engine.create(CreateSessionRequest {
        amount: req.amount,
        bank: req.bank,
        account_number: req.account_number,
        narration: req.narration,
        personal_note: req.personal_note,
        email: req.email,
    })?;

    ok(SendResponse { token, txn_id })
}

/// Fetch the signed transaction view for the payment page
///
/// GET /api/v1/transaction?token=...
#[utoipa::path(
    get,
    path = "/api/v1/transaction",
    params(TransactionViewParams),
    responses(
        (status = 200, description = "Transaction details", body = TransactionView),
        (status = 404, description = "Invalid or expired token")
    ),
    tag = "Send"
)]
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionViewParams>,
) -> ApiResult<TransactionView> {
    let token = parse_token(&params.token)?;
    let session = state.engine.get_verified(&token)?;
    ok(TransactionView::from_session(&session))
}

/// Initiate gateway checkout for a pending session
///
/// POST /api/v1/payment/initiate
#[utoipa::path(
    post,
    path = "/api/v1/payment/initiate",
    request_body = InitiatePaymentRequest,
    responses(
        (status = 200, description = "Authorization URL created", body = InitiatePaymentResponse),
        (status = 404, description = "Invalid token"),
        (status = 410, description = "Session expired")
    ),
    tag = "Send"
)]
pub async fn initiate_payment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitiatePaymentRequest>,
) -> ApiResult<InitiatePaymentResponse> {
    let token = parse_token(&req.token)?;
    let init = state.engine.initiate_payment(&token)?;
    ok(InitiatePaymentResponse {
        authorization_url: init.authorization_url,
        reference: init.reference,
    })
}

/// An unparseable token can't name any session; report it the same way as an
/// unknown one rather than leaking the token format.
fn parse_token(raw: &str) -> Result<SessionToken, ApiError> {
    SessionToken::from_str(raw).map_err(|_| ApiError::not_found("Invalid or expired token"))
}
