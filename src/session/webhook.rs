//! Payment webhook processor.
//!
//! Consumes gateway confirmation events and drives sessions from `pending`
//! through `paid` to `completed`/`failed`. The gateway retries aggressively
//! and gives no ordering guarantees, so everything here is built around two
//! CAS points in the store:
//!
//! 1. the payment claim (`pending -> paid`, sets the reference) - exactly one
//!    delivery per session wins it;
//! 2. the dispatch latch - exactly one caller per session may invoke the
//!    transfer collaborator, ever.
//!
//! Duplicate deliveries, losers of either race, and events for settled
//! sessions all resolve to success no-ops.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::signer::Signer;

use super::dispatch::{NotificationSender, TransferDispatcher};
use super::error::EngineError;
use super::status::SessionStatus;
use super::store::{PaymentClaim, SessionStore};
use super::types::SessionToken;

/// Event type the gateway sends on successful charge.
const CHARGE_SUCCESS: &str = "charge.success";

/// Raw gateway webhook payload.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct GatewayEvent {
    pub event: String,
    pub data: GatewayEventData,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct GatewayEventData {
    pub reference: String,
}

/// What a webhook delivery resolved to. All of these are 2xx to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Event type we don't process
    Ignored,
    /// Reference matches no known checkout
    UnknownReference,
    /// Transfer dispatched and session completed
    Completed { transfer_reference: String },
    /// Transfer dispatch failed; session moved to `failed` for the operator
    DispatchFailed,
    /// Session already settled (or another delivery owns the dispatch); no-op
    AlreadyProcessed,
    /// Session is held by moderation (`flagged`); confirmation does not
    /// override it
    Superseded { status: SessionStatus },
}

pub struct PaymentWebhookProcessor {
    store: Arc<SessionStore>,
    signer: Arc<Signer>,
    dispatcher: Arc<dyn TransferDispatcher>,
    notifier: Arc<dyn NotificationSender>,
}

impl PaymentWebhookProcessor {
    pub fn new(
        store: Arc<SessionStore>,
        signer: Arc<Signer>,
        dispatcher: Arc<dyn TransferDispatcher>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            store,
            signer,
            dispatcher,
            notifier,
        }
    }

    /// Process one gateway event. Safe to call any number of times with the
    /// same event: the result converges and the transfer is dispatched at
    /// most once.
    pub async fn handle(&self, event: &GatewayEvent) -> Result<WebhookOutcome, EngineError> {
        if event.event != CHARGE_SUCCESS {
            return Ok(WebhookOutcome::Ignored);
        }

        let reference = event.data.reference.as_str();
        let Some(token) = self.store.resolve_reference(reference) else {
            warn!(reference, "Webhook for unknown payment reference");
            return Ok(WebhookOutcome::UnknownReference);
        };

        let session = self.store.get(&token).ok_or(EngineError::NotFound)?;
        if !self.signer.verify(&session.metadata, &session.signature) {
            error!(
                txn_id = %session.txn_id,
                "Signature mismatch on webhook target, refusing to act"
            );
            return Err(EngineError::SignatureMismatch {
                txn_id: session.txn_id.to_string(),
            });
        }

        match self.store.claim_payment(&token, reference, Utc::now())? {
            PaymentClaim::Claimed => {
                info!(txn_id = %session.txn_id, reference, "Payment confirmed");
                self.settle(&token).await
            }
            // Same reference delivered again: fall through to settlement so a
            // crashed winner's work still converges.
            PaymentClaim::Redelivery => self.settle(&token).await,
            PaymentClaim::Expired { expired_at } => {
                warn!(txn_id = %session.txn_id, %expired_at, "Late payment confirmation rejected");
                Err(EngineError::ExpiredSession { expired_at })
            }
            PaymentClaim::Superseded { status } => {
                info!(txn_id = %session.txn_id, %status, "Webhook no-op, session not claimable");
                Ok(WebhookOutcome::Superseded { status })
            }
        }
    }

    /// Post-claim settlement: take the dispatch latch, call the transfer
    /// collaborator, record the outcome.
    async fn settle(&self, token: &SessionToken) -> Result<WebhookOutcome, EngineError> {
        if !self.store.claim_dispatch(token)? {
            let session = self.store.get(token).ok_or(EngineError::NotFound)?;
            return Ok(match session.status {
                // flagging always takes precedence over confirmation
                SessionStatus::Flagged => WebhookOutcome::Superseded {
                    status: session.status,
                },
                _ => WebhookOutcome::AlreadyProcessed,
            });
        }

        let session = self.store.get(token).ok_or(EngineError::NotFound)?;
        match self.dispatcher.dispatch(&session).await {
            Ok(transfer_reference) => {
                let status = self.store.complete_dispatch(token, &transfer_reference)?;
                if status == SessionStatus::Completed {
                    info!(
                        txn_id = %session.txn_id,
                        transfer_reference = %transfer_reference,
                        "Transfer dispatched, session completed"
                    );
                    self.notify_best_effort(token, None).await;
                } else {
                    warn!(
                        txn_id = %session.txn_id,
                        %status,
                        transfer_reference = %transfer_reference,
                        "Transfer dispatched but session was flagged mid-flight, needs operator reconciliation"
                    );
                }
                Ok(WebhookOutcome::Completed { transfer_reference })
            }
            Err(e) => {
                self.store.fail_dispatch(token, &e.to_string())?;
                warn!(txn_id = %session.txn_id, error = %e, "Transfer dispatch failed");
                Ok(WebhookOutcome::DispatchFailed)
            }
        }
    }

    async fn notify_best_effort(&self, token: &SessionToken, message: Option<&str>) {
        if let Some(session) = self.store.get(token)
            && let Err(e) = self.notifier.notify(&session, message).await
        {
            warn!(txn_id = %session.txn_id, error = %e, "Recipient notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::session::dispatch::DispatchError;
    use crate::session::engine::{CreateSessionRequest, TransactionEngine};
    use crate::session::types::TransactionSession;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDispatcher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingDispatcher {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransferDispatcher for CountingDispatcher {
        async fn dispatch(&self, _session: &TransactionSession) -> Result<String, DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DispatchError("bank unavailable".to_string()))
            } else {
                Ok(format!("TRF_{}", ulid::Ulid::new()))
            }
        }
    }

    struct NoopNotifier;

    #[async_trait]
    impl NotificationSender for NoopNotifier {
        async fn notify(
            &self,
            _session: &TransactionSession,
            _message: Option<&str>,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Stack {
        store: Arc<SessionStore>,
        engine: TransactionEngine,
        processor: PaymentWebhookProcessor,
        dispatcher: Arc<CountingDispatcher>,
    }

    fn stack_with(dispatcher: CountingDispatcher, ttl_minutes: i64) -> Stack {
        let store = Arc::new(SessionStore::new());
        let signer = Arc::new(Signer::new("test-secret"));
        let dispatcher = Arc::new(dispatcher);
        let config = SessionConfig {
            ttl_minutes,
            checkout_base_url: "https://checkout.example.com".to_string(),
        };
        Stack {
            store: store.clone(),
            engine: TransactionEngine::new(store.clone(), signer.clone(), &config),
            processor: PaymentWebhookProcessor::new(
                store,
                signer,
                dispatcher.clone(),
                Arc::new(NoopNotifier),
            ),
            dispatcher,
        }
    }

    fn charge_success(reference: &str) -> GatewayEvent {
        GatewayEvent {
            event: CHARGE_SUCCESS.to_string(),
            data: GatewayEventData {
                reference: reference.to_string(),
            },
        }
    }

    fn create_session(stack: &Stack) -> (SessionToken, String) {
        let (token, _) = stack
            .engine
            .create(CreateSessionRequest {
                amount: "50000".to_string(),
                bank: "057".to_string(),
                account_number: "0123456789".to_string(),
                narration: None,
                personal_note: None,
                email: None,
            })
            .unwrap();
        let init = stack.engine.initiate_payment(&token).unwrap();
        (token, init.reference)
    }

    #[tokio::test]
    async fn test_happy_path_completes_session() {
        let stack = stack_with(CountingDispatcher::ok(), 15);
        let (token, reference) = create_session(&stack);

        let outcome = stack.processor.handle(&charge_success(&reference)).await.unwrap();
        assert!(matches!(outcome, WebhookOutcome::Completed { .. }));

        let session = stack.store.get(&token).unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.payment_reference.as_deref(), Some(reference.as_str()));
        assert!(session.transfer_reference.is_some());
        assert_eq!(stack.dispatcher.count(), 1);
    }

    #[tokio::test]
    async fn test_replayed_event_is_noop() {
        let stack = stack_with(CountingDispatcher::ok(), 15);
        let (token, reference) = create_session(&stack);
        let event = charge_success(&reference);

        stack.processor.handle(&event).await.unwrap();
        for _ in 0..5 {
            let outcome = stack.processor.handle(&event).await.unwrap();
            assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);
        }

        assert_eq!(stack.dispatcher.count(), 1);
        assert_eq!(
            stack.store.get(&token).unwrap().status,
            SessionStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_non_charge_events_ignored() {
        let stack = stack_with(CountingDispatcher::ok(), 15);
        let (_, reference) = create_session(&stack);

        let event = GatewayEvent {
            event: "charge.failed".to_string(),
            data: GatewayEventData { reference },
        };
        assert_eq!(
            stack.processor.handle(&event).await.unwrap(),
            WebhookOutcome::Ignored
        );
        assert_eq!(stack.dispatcher.count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_reference() {
        let stack = stack_with(CountingDispatcher::ok(), 15);
        assert_eq!(
            stack
                .processor
                .handle(&charge_success("PAY_NOBODY"))
                .await
                .unwrap(),
            WebhookOutcome::UnknownReference
        );
    }

    #[tokio::test]
    async fn test_expired_session_rejected_and_unchanged() {
        let stack = stack_with(CountingDispatcher::ok(), 15);
        let (token, reference) = create_session(&stack);

        // a stack with a negative ttl creates already-expired sessions
        let expired = stack_with(CountingDispatcher::ok(), -1);
        let (etoken, _) = expired
            .engine
            .create(CreateSessionRequest {
                amount: "100".to_string(),
                bank: "057".to_string(),
                account_number: "0123456789".to_string(),
                narration: None,
                personal_note: None,
                email: None,
            })
            .unwrap();
        // bind a reference directly; initiate_payment refuses expired sessions
        expired.store.bind_reference("PAY_LATE", etoken);

        let err = expired
            .processor
            .handle(&charge_success("PAY_LATE"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ExpiredSession { .. }));
        let session = expired.store.get(&etoken).unwrap();
        assert_eq!(session.status, SessionStatus::Pending);
        assert!(session.payment_reference.is_none());
        assert_eq!(expired.dispatcher.count(), 0);

        // the healthy stack is unaffected
        stack.processor.handle(&charge_success(&reference)).await.unwrap();
        assert_eq!(
            stack.store.get(&token).unwrap().status,
            SessionStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_dispatch_failure_moves_to_failed() {
        let stack = stack_with(CountingDispatcher::failing(), 15);
        let (token, reference) = create_session(&stack);

        let outcome = stack.processor.handle(&charge_success(&reference)).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::DispatchFailed);

        let session = stack.store.get(&token).unwrap();
        assert_eq!(session.status, SessionStatus::Failed);
        assert_eq!(session.failure_reason.as_deref(), Some("bank unavailable"));

        // retries do not re-dispatch a failed session
        let outcome = stack.processor.handle(&charge_success(&reference)).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);
        assert_eq!(stack.dispatcher.count(), 1);
    }

    #[tokio::test]
    async fn test_flagged_session_wins_over_confirmation() {
        let stack = stack_with(CountingDispatcher::ok(), 15);
        let (token, reference) = create_session(&stack);

        // claim lands, then risk flags before any dispatch
        stack
            .store
            .claim_payment(&token, &reference, Utc::now())
            .unwrap();
        stack
            .store
            .update_status_if(&token, SessionStatus::Paid, SessionStatus::Flagged)
            .unwrap();

        let outcome = stack.processor.handle(&charge_success(&reference)).await.unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Superseded {
                status: SessionStatus::Flagged
            }
        );
        assert_eq!(stack.dispatcher.count(), 0);
        assert_eq!(
            stack.store.get(&token).unwrap().status,
            SessionStatus::Flagged
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deliveries_single_dispatch() {
        let stack = Arc::new(stack_with(CountingDispatcher::ok(), 15));
        let (token, reference) = create_session(&stack);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let stack = stack.clone();
            let event = charge_success(&reference);
            handles.push(tokio::spawn(async move {
                stack.processor.handle(&event).await.unwrap()
            }));
        }

        let mut completed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                WebhookOutcome::Completed { .. } => completed += 1,
                WebhookOutcome::AlreadyProcessed => {}
                other => panic!("unexpected outcome: {:?}", other),
            }
        }

        assert_eq!(completed, 1, "exactly one delivery dispatches");
        assert_eq!(stack.dispatcher.count(), 1);
        assert_eq!(
            stack.store.get(&token).unwrap().status,
            SessionStatus::Completed
        );
    }
}
