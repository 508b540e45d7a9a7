use std::sync::Arc;

use crate::session::{
    ModerationService, PaymentWebhookProcessor, SessionStore, TransactionEngine, TransactionQuery,
};

/// Shared gateway application state
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub engine: Arc<TransactionEngine>,
    pub webhooks: Arc<PaymentWebhookProcessor>,
    pub moderation: Arc<ModerationService>,
    pub query: Arc<TransactionQuery>,
}

impl AppState {
    pub fn new(
        store: Arc<SessionStore>,
        engine: Arc<TransactionEngine>,
        webhooks: Arc<PaymentWebhookProcessor>,
        moderation: Arc<ModerationService>,
        query: Arc<TransactionQuery>,
    ) -> Self {
        Self {
            store,
            engine,
            webhooks,
            moderation,
            query,
        }
    }
}
