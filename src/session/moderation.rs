//! Operator moderation operations.
//!
//! All entry points address sessions by txn id, verify the metadata
//! signature before acting, and are safe to retry: finding the session
//! already in the target state resolves to success rather than an error.

use std::sync::Arc;

use tracing::{info, warn};

use crate::signer::Signer;

use super::dispatch::{NotificationSender, RefundProcessor};
use super::error::EngineError;
use super::status::SessionStatus;
use super::store::SessionStore;
use super::types::{TransactionSession, TxnId};

/// Result of a moderation action: the txn id and the status it left the
/// session in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationOutcome {
    pub txn_id: TxnId,
    pub status: SessionStatus,
}

pub struct ModerationService {
    store: Arc<SessionStore>,
    signer: Arc<Signer>,
    refunds: Arc<dyn RefundProcessor>,
    notifier: Arc<dyn NotificationSender>,
}

impl ModerationService {
    pub fn new(
        store: Arc<SessionStore>,
        signer: Arc<Signer>,
        refunds: Arc<dyn RefundProcessor>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            store,
            signer,
            refunds,
            notifier,
        }
    }

    /// Risk evaluation boundary: hold a paid session for operator review.
    pub fn flag(&self, txn_id: &str) -> Result<ModerationOutcome, EngineError> {
        self.transition(txn_id, SessionStatus::Flagged)
    }

    /// Clear a flagged session for dispatch.
    pub fn approve(&self, txn_id: &str) -> Result<ModerationOutcome, EngineError> {
        self.transition(txn_id, SessionStatus::Approved)
    }

    /// Permanently reject a flagged session.
    pub fn reject(&self, txn_id: &str) -> Result<ModerationOutcome, EngineError> {
        self.transition(txn_id, SessionStatus::Rejected)
    }

    /// Mark a failed transfer completed with an operator-supplied bank
    /// reference (funds were moved out-of-band).
    pub fn manual_complete(
        &self,
        txn_id: &str,
        transfer_reference: &str,
    ) -> Result<ModerationOutcome, EngineError> {
        if transfer_reference.trim().is_empty() {
            return Err(EngineError::validation(
                "transfer_reference",
                "reference is required",
            ));
        }

        let session = self.resolve_verified(txn_id)?;
        if session.status == SessionStatus::Completed {
            // retried call; the original reference stands
            return Ok(self.outcome(&session));
        }

        if self.store.manual_complete(&session.token, transfer_reference)? {
            info!(txn_id, transfer_reference, "Manual transfer recorded");
            return self.settled_outcome(txn_id);
        }
        self.retry_or_conflict(txn_id, SessionStatus::Completed)
    }

    /// Refund a completed or failed transfer. The state transition and the
    /// recorded reason are this service's contract; moving the money is the
    /// payment processor's.
    pub async fn refund(
        &self,
        txn_id: &str,
        reason: &str,
    ) -> Result<ModerationOutcome, EngineError> {
        if reason.trim().is_empty() {
            return Err(EngineError::validation("reason", "reason is required"));
        }

        let session = self.resolve_verified(txn_id)?;
        if session.status == SessionStatus::Refunded {
            return Ok(self.outcome(&session));
        }

        if self.store.refund(&session.token, reason)? {
            info!(txn_id, reason, "Session refunded");
            if let Some(refunded) = self.store.get(&session.token)
                && let Err(e) = self.refunds.refund(&refunded, reason).await
            {
                warn!(txn_id, error = %e, "Refund processor call failed, needs manual follow-up");
            }
            return self.settled_outcome(txn_id);
        }
        self.retry_or_conflict(txn_id, SessionStatus::Refunded)
    }

    /// Re-send the recipient notification. Read-only with respect to the
    /// state machine.
    pub async fn resend_notification(
        &self,
        txn_id: &str,
        message: Option<&str>,
    ) -> Result<ModerationOutcome, EngineError> {
        let session = self.resolve_verified(txn_id)?;
        if let Err(e) = self.notifier.notify(&session, message).await {
            warn!(txn_id, error = %e, "Notification delivery failed");
        }
        Ok(self.outcome(&session))
    }

    /// Shared CAS transition for the pure status moves (flag/approve/reject).
    fn transition(
        &self,
        txn_id: &str,
        target: SessionStatus,
    ) -> Result<ModerationOutcome, EngineError> {
        let session = self.resolve_verified(txn_id)?;

        if session.status == target {
            return Ok(self.outcome(&session));
        }
        if !session.status.can_transition_to(target) {
            return Err(EngineError::InvalidTransition {
                from: session.status,
                to: target,
            });
        }

        if self.store.update_status_if(&session.token, session.status, target)? {
            info!(txn_id, from = %session.status, to = %target, "Moderation transition");
            return self.settled_outcome(txn_id);
        }
        self.retry_or_conflict(txn_id, target)
    }

    /// A CAS lost the race. If the racer moved the session into our target
    /// anyway, that's the idempotent success case; otherwise report the
    /// conflict.
    fn retry_or_conflict(
        &self,
        txn_id: &str,
        target: SessionStatus,
    ) -> Result<ModerationOutcome, EngineError> {
        let session = self
            .store
            .get_by_txn_id(txn_id)
            .ok_or(EngineError::NotFound)?;
        if session.status == target {
            Ok(self.outcome(&session))
        } else {
            Err(EngineError::InvalidTransition {
                from: session.status,
                to: target,
            })
        }
    }

    fn resolve_verified(&self, txn_id: &str) -> Result<TransactionSession, EngineError> {
        let session = self
            .store
            .get_by_txn_id(txn_id)
            .ok_or(EngineError::NotFound)?;
        if !self.signer.verify(&session.metadata, &session.signature) {
            return Err(EngineError::SignatureMismatch {
                txn_id: session.txn_id.to_string(),
            });
        }
        Ok(session)
    }

    fn settled_outcome(&self, txn_id: &str) -> Result<ModerationOutcome, EngineError> {
        let session = self
            .store
            .get_by_txn_id(txn_id)
            .ok_or(EngineError::NotFound)?;
        Ok(self.outcome(&session))
    }

    fn outcome(&self, session: &TransactionSession) -> ModerationOutcome {
        ModerationOutcome {
            txn_id: session.txn_id.clone(),
            status: session.status,
        }
    }
}
