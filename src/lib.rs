//! AnonSend - anonymous one-way funds transfer backend.
//!
//! A sender records transfer intent as a signed session, pays through an
//! external gateway, and the engine drives the session to completion when
//! the gateway's confirmation webhook lands. Operators moderate risky
//! transfers through the same state machine.
//!
//! # Modules
//!
//! - [`session`] - the lifecycle engine: store, state machine, webhook
//!   processing, moderation, listing
//! - [`signer`] - keyed MAC over canonical session metadata
//! - [`gateway`] - axum HTTP surface
//! - [`banks`] - NGN bank code directory
//! - [`config`] / [`logging`] - service configuration and tracing setup

pub mod banks;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod session;
pub mod signer;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use session::{
    CreateSessionRequest, EngineError, GatewayEvent, ListFilter, ModerationService,
    PaymentWebhookProcessor, SessionStatus, SessionStore, SessionToken, TransactionEngine,
    TransactionQuery, TransactionSession, TxnId, WebhookOutcome,
};
pub use signer::Signer;
