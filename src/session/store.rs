//! Session store.
//!
//! Keyed map from session token to session record with atomic per-key
//! read-modify-write. All state updates are CAS-shaped: read current status,
//! check the edge, write - under the map's per-key write guard, so two racers
//! on the same token cannot both move it from the same source state.
//! Operations on different tokens proceed in parallel; there is no global
//! lock.
//!
//! Two secondary indexes are maintained in step with the primary map:
//! `txn_id -> token` for O(1) moderation lookups and
//! `payment reference -> token` for webhook resolution (no linear scans).

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::error::EngineError;
use super::status::SessionStatus;
use super::types::{SessionToken, TransactionSession};

/// Outcome of a payment claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentClaim {
    /// This call won the claim: reference recorded, status moved to `paid`
    Claimed,
    /// The session was already claimed by this same reference (duplicate delivery)
    Redelivery,
    /// The session is past its payment window; record unchanged
    Expired { expired_at: DateTime<Utc> },
    /// The session is not claimable (wrong state, or claimed by another reference)
    Superseded { status: SessionStatus },
}

/// In-process session store backed by a sharded concurrent map.
///
/// Swapping in a durable backend means reimplementing these operations over
/// a transactional keyed store; the CAS contracts stay identical.
pub struct SessionStore {
    sessions: DashMap<SessionToken, TransactionSession>,
    txn_index: DashMap<String, SessionToken>,
    reference_index: DashMap<String, SessionToken>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            txn_index: DashMap::new(),
            reference_index: DashMap::new(),
        }
    }

    /// Insert a freshly created session. Tokens are never reused.
    pub fn insert(&self, session: TransactionSession) -> Result<(), EngineError> {
        match self.sessions.entry(session.token) {
            Entry::Occupied(_) => Err(EngineError::DuplicateToken),
            Entry::Vacant(slot) => {
                self.txn_index
                    .insert(session.txn_id.to_string(), session.token);
                slot.insert(session);
                Ok(())
            }
        }
    }

    pub fn get(&self, token: &SessionToken) -> Option<TransactionSession> {
        self.sessions.get(token).map(|s| s.clone())
    }

    pub fn token_for_txn(&self, txn_id: &str) -> Option<SessionToken> {
        self.txn_index.get(txn_id).map(|t| *t)
    }

    pub fn get_by_txn_id(&self, txn_id: &str) -> Option<TransactionSession> {
        self.token_for_txn(txn_id).and_then(|t| self.get(&t))
    }

    /// Bind a checkout reference to a session ahead of confirmation.
    ///
    /// First-writer-wins per reference; returns false if the reference is
    /// already bound to a different session.
    pub fn bind_reference(&self, reference: &str, token: SessionToken) -> bool {
        match self.reference_index.entry(reference.to_string()) {
            Entry::Occupied(existing) => *existing.get() == token,
            Entry::Vacant(slot) => {
                slot.insert(token);
                true
            }
        }
    }

    pub fn resolve_reference(&self, reference: &str) -> Option<SessionToken> {
        self.reference_index.get(reference).map(|t| *t)
    }

    /// Atomic per-key mutation. The closure runs under the entry's write
    /// guard and must not block; it calls `touch` when it actually changed
    /// the record.
    fn mutate<R>(
        &self,
        token: &SessionToken,
        f: impl FnOnce(&mut TransactionSession) -> R,
    ) -> Result<R, EngineError> {
        let mut entry = self.sessions.get_mut(token).ok_or(EngineError::NotFound)?;
        Ok(f(&mut entry))
    }

    /// Claim payment confirmation for a session: CAS `pending -> paid`,
    /// recording the gateway reference. Exactly one delivery per session can
    /// ever observe `Claimed`.
    pub fn claim_payment(
        &self,
        token: &SessionToken,
        reference: &str,
        now: DateTime<Utc>,
    ) -> Result<PaymentClaim, EngineError> {
        self.mutate(token, |session| {
            if session.payment_reference.as_deref() == Some(reference) {
                return PaymentClaim::Redelivery;
            }
            if session.status != SessionStatus::Pending || session.payment_reference.is_some() {
                return PaymentClaim::Superseded {
                    status: session.status,
                };
            }
            if session.metadata.is_expired(now) {
                return PaymentClaim::Expired {
                    expired_at: session.metadata.expires_at,
                };
            }
            session.payment_reference = Some(reference.to_string());
            session.status = SessionStatus::Paid;
            touch(session);
            PaymentClaim::Claimed
        })
    }

    /// Take the once-only dispatch latch. Returns true for exactly one caller
    /// over the session's lifetime, and only while the status allows
    /// dispatching. Callers that get false must not invoke the transfer
    /// collaborator.
    pub fn claim_dispatch(&self, token: &SessionToken) -> Result<bool, EngineError> {
        self.mutate(token, |session| {
            if session.status.is_dispatchable() && !session.dispatch_started {
                session.dispatch_started = true;
                touch(session);
                true
            } else {
                false
            }
        })
    }

    /// Record a successful dispatch: set the transfer reference and CAS
    /// `paid|approved -> completed`.
    ///
    /// If risk flagged the session while the dispatch was in flight the
    /// status CAS fails closed: the reference is still recorded so the
    /// operator can reconcile, and the returned status shows what happened.
    pub fn complete_dispatch(
        &self,
        token: &SessionToken,
        transfer_reference: &str,
    ) -> Result<SessionStatus, EngineError> {
        self.mutate(token, |session| {
            session.transfer_reference = Some(transfer_reference.to_string());
            if session.status.is_dispatchable() {
                session.status = SessionStatus::Completed;
            }
            touch(session);
            session.status
        })
    }

    /// Record a failed dispatch: CAS `paid|approved -> failed` with the
    /// reason kept for the operator.
    pub fn fail_dispatch(
        &self,
        token: &SessionToken,
        reason: &str,
    ) -> Result<SessionStatus, EngineError> {
        self.mutate(token, |session| {
            session.failure_reason = Some(reason.to_string());
            if session.status.is_dispatchable() {
                session.status = SessionStatus::Failed;
            }
            touch(session);
            session.status
        })
    }

    /// Generic CAS: move `expected -> new` if that edge is legal and the
    /// session is currently in `expected`. Returns false when the current
    /// status didn't match (another operation got there first).
    pub fn update_status_if(
        &self,
        token: &SessionToken,
        expected: SessionStatus,
        new: SessionStatus,
    ) -> Result<bool, EngineError> {
        if !expected.can_transition_to(new) {
            return Err(EngineError::InvalidTransition {
                from: expected,
                to: new,
            });
        }
        self.mutate(token, |session| {
            if session.status == expected {
                session.status = new;
                touch(session);
                true
            } else {
                false
            }
        })
    }

    /// CAS `failed -> completed` with an operator-supplied transfer reference.
    pub fn manual_complete(
        &self,
        token: &SessionToken,
        transfer_reference: &str,
    ) -> Result<bool, EngineError> {
        self.mutate(token, |session| {
            if session.status == SessionStatus::Failed {
                session.transfer_reference = Some(transfer_reference.to_string());
                session.status = SessionStatus::Completed;
                touch(session);
                true
            } else {
                false
            }
        })
    }

    /// CAS `completed|failed -> refunded`, recording the reason.
    pub fn refund(&self, token: &SessionToken, reason: &str) -> Result<bool, EngineError> {
        self.mutate(token, |session| {
            if session.status.can_transition_to(SessionStatus::Refunded) {
                session.refund_reason = Some(reason.to_string());
                session.status = SessionStatus::Refunded;
                touch(session);
                true
            } else {
                false
            }
        })
    }

    /// Point-in-time copy of all sessions, for read-only listing.
    pub fn snapshot(&self) -> Vec<TransactionSession> {
        self.sessions.iter().map(|s| s.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn touch(session: &mut TransactionSession) {
    session.updated_at = Utc::now();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::{TransactionDetails, TransactionMetadata, TxnId};
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn make_session(ttl_minutes: i64) -> TransactionSession {
        let now = Utc::now();
        let metadata = TransactionMetadata {
            txn_id: TxnId::new(),
            amount: Decimal::from(50_000u32),
            created_at: now,
            expires_at: now + Duration::minutes(ttl_minutes),
        };
        TransactionSession::new(
            SessionToken::new(),
            metadata,
            "sig".to_string(),
            TransactionDetails {
                bank: "057".to_string(),
                account_number: "0123456789".to_string(),
                narration: None,
                personal_note: None,
                email: None,
            },
        )
    }

    #[test]
    fn test_insert_and_lookup() {
        let store = SessionStore::new();
        let session = make_session(15);
        let token = session.token;
        let txn_id = session.txn_id.clone();

        store.insert(session).unwrap();

        assert!(store.get(&token).is_some());
        assert_eq!(
            store.get_by_txn_id(txn_id.as_str()).unwrap().token,
            token
        );
        assert!(store.get_by_txn_id("TXN_MISSING").is_none());
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let store = SessionStore::new();
        let session = make_session(15);
        let dup = session.clone();

        store.insert(session).unwrap();
        assert!(matches!(
            store.insert(dup),
            Err(EngineError::DuplicateToken)
        ));
    }

    #[test]
    fn test_claim_payment_once() {
        let store = SessionStore::new();
        let session = make_session(15);
        let token = session.token;
        store.insert(session).unwrap();

        let now = Utc::now();
        assert_eq!(
            store.claim_payment(&token, "PAY_1", now).unwrap(),
            PaymentClaim::Claimed
        );
        // same reference again: duplicate delivery
        assert_eq!(
            store.claim_payment(&token, "PAY_1", now).unwrap(),
            PaymentClaim::Redelivery
        );
        // different reference cannot steal a claimed session
        assert!(matches!(
            store.claim_payment(&token, "PAY_2", now).unwrap(),
            PaymentClaim::Superseded {
                status: SessionStatus::Paid
            }
        ));
        assert_eq!(
            store.get(&token).unwrap().payment_reference.as_deref(),
            Some("PAY_1")
        );
    }

    #[test]
    fn test_claim_payment_expired_leaves_record_unchanged() {
        let store = SessionStore::new();
        let session = make_session(-1);
        let token = session.token;
        store.insert(session).unwrap();

        let claim = store.claim_payment(&token, "PAY_1", Utc::now()).unwrap();
        assert!(matches!(claim, PaymentClaim::Expired { .. }));

        let session = store.get(&token).unwrap();
        assert_eq!(session.status, SessionStatus::Pending);
        assert!(session.payment_reference.is_none());
    }

    #[test]
    fn test_claim_dispatch_latch_is_once_only() {
        let store = SessionStore::new();
        let session = make_session(15);
        let token = session.token;
        store.insert(session).unwrap();
        store.claim_payment(&token, "PAY_1", Utc::now()).unwrap();

        assert!(store.claim_dispatch(&token).unwrap());
        assert!(!store.claim_dispatch(&token).unwrap());
    }

    #[test]
    fn test_claim_dispatch_requires_dispatchable_state() {
        let store = SessionStore::new();
        let session = make_session(15);
        let token = session.token;
        store.insert(session).unwrap();

        // still pending
        assert!(!store.claim_dispatch(&token).unwrap());
    }

    #[test]
    fn test_complete_dispatch_fails_closed_when_flagged() {
        let store = SessionStore::new();
        let session = make_session(15);
        let token = session.token;
        store.insert(session).unwrap();
        store.claim_payment(&token, "PAY_1", Utc::now()).unwrap();
        assert!(store.claim_dispatch(&token).unwrap());

        // risk lands while the dispatch is in flight
        assert!(store
            .update_status_if(&token, SessionStatus::Paid, SessionStatus::Flagged)
            .unwrap());

        let status = store.complete_dispatch(&token, "TRF_X").unwrap();
        assert_eq!(status, SessionStatus::Flagged);
        // reference still recorded for operator reconciliation
        assert_eq!(
            store.get(&token).unwrap().transfer_reference.as_deref(),
            Some("TRF_X")
        );
    }

    #[test]
    fn test_update_status_if_rejects_illegal_edge() {
        let store = SessionStore::new();
        let session = make_session(15);
        let token = session.token;
        store.insert(session).unwrap();

        let err = store
            .update_status_if(&token, SessionStatus::Pending, SessionStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
        assert_eq!(store.get(&token).unwrap().status, SessionStatus::Pending);
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(SessionStore::new());
        let session = make_session(15);
        let token = session.token;
        store.insert(session).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                store.claim_payment(&token, "PAY_RACE", Utc::now()).unwrap()
            }));
        }

        let outcomes: Vec<PaymentClaim> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = outcomes
            .iter()
            .filter(|o| **o == PaymentClaim::Claimed)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(store.get(&token).unwrap().status, SessionStatus::Paid);
    }

    #[test]
    fn test_concurrent_dispatch_latch_one_winner() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(SessionStore::new());
        let session = make_session(15);
        let token = session.token;
        store.insert(session).unwrap();
        store.claim_payment(&token, "PAY_1", Utc::now()).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(thread::spawn(move || store.claim_dispatch(&token).unwrap()));
        }

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_bind_reference_first_writer_wins() {
        let store = SessionStore::new();
        let a = make_session(15);
        let b = make_session(15);
        let (ta, tb) = (a.token, b.token);
        store.insert(a).unwrap();
        store.insert(b).unwrap();

        assert!(store.bind_reference("PAY_1", ta));
        assert!(store.bind_reference("PAY_1", ta)); // rebind same pair ok
        assert!(!store.bind_reference("PAY_1", tb)); // stolen reference refused
        assert_eq!(store.resolve_reference("PAY_1"), Some(ta));
    }

    #[test]
    fn test_refund_sources() {
        let store = SessionStore::new();
        let session = make_session(15);
        let token = session.token;
        store.insert(session).unwrap();

        // pending is not refundable
        assert!(!store.refund(&token, "sender request").unwrap());

        store.claim_payment(&token, "PAY_1", Utc::now()).unwrap();
        store.claim_dispatch(&token).unwrap();
        store.complete_dispatch(&token, "TRF_1").unwrap();

        assert!(store.refund(&token, "sender request").unwrap());
        let session = store.get(&token).unwrap();
        assert_eq!(session.status, SessionStatus::Refunded);
        assert_eq!(session.refund_reason.as_deref(), Some("sender request"));
    }
}
