//! Transaction engine: session creation, lookup, payment initiation.
//!
//! Validation happens here, not in the gateway layer, so internal callers
//! cannot bypass it.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::config::SessionConfig;
use crate::signer::Signer;

use super::error::EngineError;
use super::status::SessionStatus;
use super::store::SessionStore;
use super::types::{
    SessionToken, TransactionDetails, TransactionMetadata, TransactionSession, TxnId,
};

/// Upper bound on a single transfer (NGN). The lower bound is exclusive zero.
pub const MAX_AMOUNT: u32 = 100_000;

/// Input to [`TransactionEngine::create`]. Amount arrives as a string from
/// the form collaborator and is parsed/validated here.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub amount: String,
    pub bank: String,
    pub account_number: String,
    pub narration: Option<String>,
    pub personal_note: Option<String>,
    pub email: Option<String>,
}

/// Result of binding a checkout reference to a session.
#[derive(Debug, Clone)]
pub struct PaymentInitiation {
    pub authorization_url: String,
    pub reference: String,
}

pub struct TransactionEngine {
    store: Arc<SessionStore>,
    signer: Arc<Signer>,
    ttl: Duration,
    checkout_base_url: String,
}

impl TransactionEngine {
    pub fn new(store: Arc<SessionStore>, signer: Arc<Signer>, config: &SessionConfig) -> Self {
        Self {
            store,
            signer,
            ttl: Duration::minutes(config.ttl_minutes),
            checkout_base_url: config.checkout_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a signed session in `pending` status.
    ///
    /// Returns the opaque token (the sender's capability) and the
    /// operator-facing txn id.
    pub fn create(
        &self,
        req: CreateSessionRequest,
    ) -> Result<(SessionToken, TxnId), EngineError> {
        let amount = validate_amount(&req.amount)?;
        validate_account_number(&req.account_number)?;
        if req.bank.trim().is_empty() {
            return Err(EngineError::validation("bank", "bank code is required"));
        }

        let token = SessionToken::new();
        let now = Utc::now();
        let metadata = TransactionMetadata {
            txn_id: TxnId::new(),
            amount,
            created_at: now,
            expires_at: now + self.ttl,
        };
        let signature = self.signer.sign(&metadata);
        let txn_id = metadata.txn_id.clone();

        let session = TransactionSession::new(
            token,
            metadata,
            signature,
            TransactionDetails {
                bank: req.bank,
                account_number: req.account_number,
                narration: none_if_blank(req.narration),
                personal_note: none_if_blank(req.personal_note),
                email: none_if_blank(req.email),
            },
        );
        self.store.insert(session)?;

        info!(txn_id = %txn_id, amount = %amount, "Session created");
        Ok((token, txn_id))
    }

    /// Read-only lookup. Callers making trust decisions must use
    /// [`Self::get_verified`] instead.
    pub fn get(&self, token: &SessionToken) -> Result<TransactionSession, EngineError> {
        self.store.get(token).ok_or(EngineError::NotFound)
    }

    /// Lookup plus signature verification. A record whose metadata no longer
    /// matches its MAC is treated as tampered and never acted upon.
    pub fn get_verified(&self, token: &SessionToken) -> Result<TransactionSession, EngineError> {
        let session = self.get(token)?;
        if !self.signer.verify(&session.metadata, &session.signature) {
            return Err(EngineError::SignatureMismatch {
                txn_id: session.txn_id.to_string(),
            });
        }
        Ok(session)
    }

    /// Bind a fresh gateway checkout reference to a pending session and
    /// return the hosted checkout URL.
    ///
    /// Repeated initiation issues a fresh reference each time; only the one
    /// the gateway eventually confirms claims the session.
    pub fn initiate_payment(
        &self,
        token: &SessionToken,
    ) -> Result<PaymentInitiation, EngineError> {
        let session = self.get_verified(token)?;

        if session.status != SessionStatus::Pending {
            return Err(EngineError::InvalidTransition {
                from: session.status,
                to: SessionStatus::Paid,
            });
        }
        if session.metadata.is_expired(Utc::now()) {
            return Err(EngineError::ExpiredSession {
                expired_at: session.metadata.expires_at,
            });
        }

        let reference = format!("PAY_{}", ulid::Ulid::new());
        self.store.bind_reference(&reference, *token);

        info!(txn_id = %session.txn_id, reference = %reference, "Checkout initiated");
        Ok(PaymentInitiation {
            authorization_url: format!("{}/{}", self.checkout_base_url, token),
            reference,
        })
    }
}

fn validate_amount(raw: &str) -> Result<Decimal, EngineError> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| EngineError::validation("amount", format!("not a number: '{}'", raw)))?;
    if amount <= Decimal::ZERO {
        return Err(EngineError::validation("amount", "must be greater than zero"));
    }
    if amount > Decimal::from(MAX_AMOUNT) {
        return Err(EngineError::validation(
            "amount",
            format!("exceeds maximum of {}", MAX_AMOUNT),
        ));
    }
    Ok(amount)
}

fn validate_account_number(raw: &str) -> Result<(), EngineError> {
    if raw.len() != 10 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(EngineError::validation(
            "account_number",
            "must be exactly 10 digits",
        ));
    }
    Ok(())
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
