//! External collaborator seams.
//!
//! The engine never talks to a bank, a refund API, or an SMS provider
//! directly; it goes through these traits. `main` wires the simulated
//! implementations, tests wire mocks.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use super::types::TransactionSession;

/// Why a transfer dispatch failed. Carried into the session's
/// `failure_reason` for the operator.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct DispatchError(pub String);

/// Dispatches funds to the recipient's bank account.
///
/// At most one call per session is guaranteed by the engine's dispatch
/// latch; implementations do not need their own dedup.
#[async_trait]
pub trait TransferDispatcher: Send + Sync {
    /// Returns the bank transfer reference on success.
    async fn dispatch(&self, session: &TransactionSession) -> Result<String, DispatchError>;
}

/// Returns funds to the sender through the payment processor.
#[async_trait]
pub trait RefundProcessor: Send + Sync {
    async fn refund(&self, session: &TransactionSession, reason: &str) -> anyhow::Result<()>;
}

/// Delivers recipient-facing notifications (SMS/email).
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn notify(
        &self,
        session: &TransactionSession,
        message: Option<&str>,
    ) -> anyhow::Result<()>;
}

/// Stand-in dispatcher for local runs: always succeeds with a fresh
/// transfer reference.
pub struct SimulatedDispatcher;

#[async_trait]
impl TransferDispatcher for SimulatedDispatcher {
    async fn dispatch(&self, session: &TransactionSession) -> Result<String, DispatchError> {
        let reference = format!("TRF_{}", ulid::Ulid::new());
        info!(
            txn_id = %session.txn_id,
            transfer_reference = %reference,
            "Simulated transfer dispatch"
        );
        Ok(reference)
    }
}

/// Stand-in refund processor for local runs.
pub struct SimulatedRefundProcessor;

#[async_trait]
impl RefundProcessor for SimulatedRefundProcessor {
    async fn refund(&self, session: &TransactionSession, reason: &str) -> anyhow::Result<()> {
        info!(txn_id = %session.txn_id, reason, "Simulated refund");
        Ok(())
    }
}

/// Notification sender that only logs; real delivery is an external service.
pub struct LoggingNotifier;

#[async_trait]
impl NotificationSender for LoggingNotifier {
    async fn notify(
        &self,
        session: &TransactionSession,
        message: Option<&str>,
    ) -> anyhow::Result<()> {
        info!(
            txn_id = %session.txn_id,
            bank = %session.details.bank,
            custom = message.is_some(),
            "Recipient notification queued"
        );
        Ok(())
    }
}
