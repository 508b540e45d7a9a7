//! API boundary types.
//!
//! - [`ApiResponse<T>`]: unified response wrapper
//! - [`ApiError`]: gateway-level error with HTTP status + envelope code
//! - Request/response DTOs (camelCase wire format)

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::banks;
use crate::session::{EngineError, SessionStatus, SessionToken, TransactionSession, TxnId};

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = 0)]
    pub code: i32,
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<T> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Standard API error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;

    // Resource/state errors (4xxx)
    pub const SESSION_NOT_FOUND: i32 = 4001;
    pub const SESSION_EXPIRED: i32 = 4101;
    pub const INVALID_TRANSITION: i32 = 4201;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SIGNATURE_MISMATCH: i32 = 5100;
    pub const DISPATCH_FAILED: i32 = 5200;
}

/// Gateway error: HTTP status plus the envelope code/message.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error_codes::SESSION_NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let code = match &e {
            EngineError::Validation { .. } => error_codes::INVALID_PARAMETER,
            EngineError::NotFound => error_codes::SESSION_NOT_FOUND,
            EngineError::ExpiredSession { .. } => error_codes::SESSION_EXPIRED,
            EngineError::InvalidTransition { .. } => error_codes::INVALID_TRANSITION,
            EngineError::SignatureMismatch { .. } => error_codes::SIGNATURE_MISMATCH,
            EngineError::DispatchFailed(_) => error_codes::DISPATCH_FAILED,
            EngineError::DuplicateToken => error_codes::INTERNAL_ERROR,
        };
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, code, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: ApiResponse<()> = ApiResponse::error(self.code, self.msg);
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Shorthand for a success envelope
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

/// POST /api/v1/send request body
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    /// Transfer amount as a decimal string
    #[schema(example = "50000")]
    pub amount: String,
    /// Recipient bank code
    #[schema(example = "057")]
    pub bank: String,
    /// Recipient account number (10 digits)
    #[schema(example = "0123456789")]
    pub account_number: String,
    pub narration: Option<String>,
    pub personal_note: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub token: SessionToken,
    pub txn_id: TxnId,
}

/// GET /api/v1/transaction query params
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct TransactionViewParams {
    pub token: String,
}

/// Signed-metadata view for the payment page
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub amount: Decimal,
    pub recipient_bank: String,
    pub recipient_account_number: String,
    pub status: SessionStatus,
    pub expires_at: DateTime<Utc>,
    /// Operator-facing reference for support enquiries
    pub reference: TxnId,
}

impl TransactionView {
    pub fn from_session(session: &TransactionSession) -> Self {
        Self {
            amount: session.metadata.amount,
            recipient_bank: banks::bank_display(&session.details.bank),
            recipient_account_number: session.details.account_number.clone(),
            status: session.status,
            expires_at: session.metadata.expires_at,
            reference: session.txn_id.clone(),
        }
    }
}

/// POST /api/v1/payment/initiate request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct InitiatePaymentRequest {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    pub authorization_url: String,
    pub reference: String,
}

/// Webhook acknowledgement body
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    /// What the delivery resolved to
    #[schema(example = "completed")]
    pub status: String,
}

/// Admin listing query params
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AdminListParams {
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Full session view for operators. The session token stays server-side;
/// operators work with txn ids.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminSessionView {
    pub txn_id: TxnId,
    pub amount: Decimal,
    pub bank: String,
    pub bank_name: String,
    pub account_number: String,
    pub narration: Option<String>,
    pub personal_note: Option<String>,
    pub email: Option<String>,
    pub status: SessionStatus,
    pub payment_reference: Option<String>,
    pub transfer_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub refund_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminSessionView {
    pub fn from_session(session: &TransactionSession) -> Self {
        Self {
            txn_id: session.txn_id.clone(),
            amount: session.metadata.amount,
            bank: session.details.bank.clone(),
            bank_name: banks::bank_display(&session.details.bank),
            account_number: session.details.account_number.clone(),
            narration: session.details.narration.clone(),
            personal_note: session.details.personal_note.clone(),
            email: session.details.email.clone(),
            status: session.status,
            payment_reference: session.payment_reference.clone(),
            transfer_reference: session.transfer_reference.clone(),
            failure_reason: session.failure_reason.clone(),
            refund_reason: session.refund_reason.clone(),
            created_at: session.metadata.created_at,
            expires_at: session.metadata.expires_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminListResponse {
    pub items: Vec<AdminSessionView>,
    pub total: usize,
}

/// POST .../manual-transfer request body
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualTransferRequest {
    pub transfer_reference: String,
}

/// POST .../refund request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundRequest {
    pub reason: String,
}

/// POST .../resend-notification request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResendNotificationRequest {
    pub message: Option<String>,
}

/// Moderation action result
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResponse {
    pub txn_id: TxnId,
    pub status: SessionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_mapping() {
        let err: ApiError = EngineError::NotFound.into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, error_codes::SESSION_NOT_FOUND);

        let err: ApiError = EngineError::validation("amount", "bad").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, error_codes::INVALID_PARAMETER);

        let err: ApiError = EngineError::InvalidTransition {
            from: SessionStatus::Completed,
            to: SessionStatus::Rejected,
        }
        .into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, error_codes::INVALID_TRANSITION);
    }

    #[test]
    fn test_send_request_wire_format() {
        let body = r#"{
            "amount": "50000",
            "bank": "057",
            "accountNumber": "0123456789",
            "personalNote": "for you"
        }"#;
        let req: SendRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.account_number, "0123456789");
        assert_eq!(req.personal_note.as_deref(), Some("for you"));
        assert!(req.narration.is_none());
    }

    #[test]
    fn test_envelope_shapes() {
        let success = serde_json::to_value(ApiResponse::success(5)).unwrap();
        assert_eq!(success["code"], 0);
        assert_eq!(success["data"], 5);

        let error = serde_json::to_value(ApiResponse::<()>::error(
            error_codes::SESSION_EXPIRED,
            "expired",
        ))
        .unwrap();
        assert_eq!(error["code"], 4101);
        assert!(error.get("data").is_none());
    }
}
