//! OpenAPI / Swagger UI documentation.
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{
    AdminListResponse, AdminSessionView, InitiatePaymentRequest, InitiatePaymentResponse,
    ManualTransferRequest, ModerationResponse, RefundRequest, ResendNotificationRequest,
    SendRequest, SendResponse, TransactionView, WebhookAck,
};
use crate::session::{GatewayEvent, GatewayEventData, SessionStatus};

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "AnonSend API",
        version = "1.0.0",
        description = "Anonymous one-way funds transfer: signed transaction sessions, gateway webhook processing, operator moderation.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::send::create_session,
        crate::gateway::handlers::send::get_transaction,
        crate::gateway::handlers::send::initiate_payment,
        crate::gateway::handlers::webhook::gateway_webhook,
        crate::gateway::handlers::admin::list_transactions,
        crate::gateway::handlers::admin::get_transaction,
        crate::gateway::handlers::admin::flag_transaction,
        crate::gateway::handlers::admin::approve_transaction,
        crate::gateway::handlers::admin::reject_transaction,
        crate::gateway::handlers::admin::manual_transfer,
        crate::gateway::handlers::admin::refund_transaction,
        crate::gateway::handlers::admin::resend_notification,
        crate::gateway::handlers::health::health_check,
    ),
    components(schemas(
        SendRequest,
        SendResponse,
        TransactionView,
        InitiatePaymentRequest,
        InitiatePaymentResponse,
        GatewayEvent,
        GatewayEventData,
        WebhookAck,
        AdminListResponse,
        AdminSessionView,
        ManualTransferRequest,
        RefundRequest,
        ResendNotificationRequest,
        ModerationResponse,
        HealthResponse,
        SessionStatus,
    )),
    tags(
        (name = "Send", description = "Sender-facing session endpoints"),
        (name = "Webhook", description = "Payment gateway callbacks"),
        (name = "Admin", description = "Operator moderation and listing"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;
