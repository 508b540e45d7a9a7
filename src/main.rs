//! AnonSend service entry point.
//!
//! Wires the session engine to the HTTP gateway with the simulated external
//! collaborators (transfer dispatch, refunds, notifications). Real
//! deployments swap those for bank/processor integrations.

use std::sync::Arc;

use tracing::info;

use anonsend::config::AppConfig;
use anonsend::gateway::{self, state::AppState};
use anonsend::logging::init_logging;
use anonsend::session::{
    LoggingNotifier, ModerationService, PaymentWebhookProcessor, SessionStore,
    SimulatedDispatcher, SimulatedRefundProcessor, TransactionEngine, TransactionQuery,
};
use anonsend::signer::Signer;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    info!(env = %env, "Starting anonsend");

    let store = Arc::new(SessionStore::new());
    let signer = Arc::new(Signer::new(&config.resolve_signing_secret()));

    let engine = Arc::new(TransactionEngine::new(
        store.clone(),
        signer.clone(),
        &config.session,
    ));
    let webhooks = Arc::new(PaymentWebhookProcessor::new(
        store.clone(),
        signer.clone(),
        Arc::new(SimulatedDispatcher),
        Arc::new(LoggingNotifier),
    ));
    let moderation = Arc::new(ModerationService::new(
        store.clone(),
        signer,
        Arc::new(SimulatedRefundProcessor),
        Arc::new(LoggingNotifier),
    ));
    let query = Arc::new(TransactionQuery::new(store.clone()));

    let app_state = Arc::new(AppState::new(store, engine, webhooks, moderation, query));

    gateway::serve(&config.gateway, app_state).await
}
