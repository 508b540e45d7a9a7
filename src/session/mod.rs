//! Transaction session lifecycle engine.
//!
//! A session records one sender's transfer intent: signed metadata, recipient
//! details, and a status that only ever moves along the state machine in
//! [`status`]. The engine creates sessions, the webhook processor consumes
//! gateway confirmations, and the moderation service gives operators the
//! override edges. Everything mutates through the store's per-token CAS
//! primitives.

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod moderation;
pub mod query;
pub mod status;
pub mod store;
pub mod types;
pub mod webhook;

pub use dispatch::{
    DispatchError, LoggingNotifier, NotificationSender, RefundProcessor, SimulatedDispatcher,
    SimulatedRefundProcessor, TransferDispatcher,
};
pub use engine::{CreateSessionRequest, PaymentInitiation, TransactionEngine, MAX_AMOUNT};
pub use error::EngineError;
pub use moderation::{ModerationOutcome, ModerationService};
pub use query::{ListFilter, SessionPage, TransactionQuery};
pub use status::SessionStatus;
pub use store::{PaymentClaim, SessionStore};
pub use types::{
    SessionToken, TransactionDetails, TransactionMetadata, TransactionSession, TxnId,
};
pub use webhook::{GatewayEvent, GatewayEventData, PaymentWebhookProcessor, WebhookOutcome};
