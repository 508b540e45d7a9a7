//! HTTP gateway: axum router wiring and server entry.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::GatewayConfig;
use state::AppState;

/// Build the full application router.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let admin_routes = Router::new()
        .route("/transactions", get(handlers::admin::list_transactions))
        .route("/transactions/{txn_id}", get(handlers::admin::get_transaction))
        .route(
            "/transactions/{txn_id}/flag",
            post(handlers::admin::flag_transaction),
        )
        .route(
            "/transactions/{txn_id}/approve",
            post(handlers::admin::approve_transaction),
        )
        .route(
            "/transactions/{txn_id}/reject",
            post(handlers::admin::reject_transaction),
        )
        .route(
            "/transactions/{txn_id}/manual-transfer",
            post(handlers::admin::manual_transfer),
        )
        .route(
            "/transactions/{txn_id}/refund",
            post(handlers::admin::refund_transaction),
        )
        .route(
            "/transactions/{txn_id}/resend-notification",
            post(handlers::admin::resend_notification),
        );

    Router::new()
        .route("/api/v1/send", post(handlers::send::create_session))
        .route("/api/v1/transaction", get(handlers::send::get_transaction))
        .route(
            "/api/v1/payment/initiate",
            post(handlers::send::initiate_payment),
        )
        .route(
            "/api/v1/webhook/gateway",
            post(handlers::webhook::gateway_webhook),
        )
        .nest("/api/v1/admin", admin_routes)
        .route("/api/v1/health", get(handlers::health::health_check))
        .merge(
            SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .with_state(app_state)
}

/// Bind and serve until shutdown.
pub async fn serve(config: &GatewayConfig, app_state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Gateway listening");

    axum::serve(listener, build_router(app_state).into_make_service()).await?;
    Ok(())
}
