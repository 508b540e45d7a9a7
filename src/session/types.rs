//! Core session types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::status::SessionStatus;

/// Opaque session token - the unguessable capability identifying a session.
///
/// Handed to the sender at creation; whoever holds it can view the session
/// and initiate checkout. Never reused and never part of the signed payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(transparent)]
pub struct SessionToken(uuid::Uuid);

impl SessionToken {
    /// Generate a new random session token
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(uuid::Uuid::parse_str(s)?))
    }
}

/// Operator-facing transaction identifier, distinct from the session token.
///
/// ULID-based so ids sort by creation time in operator tooling and logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct TxnId(String);

impl TxnId {
    /// Generate a new unique TxnId
    pub fn new() -> Self {
        Self(format!("TXN_{}", ulid::Ulid::new()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TxnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TxnId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Recipient and sender details captured at creation. Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    /// Recipient bank code (see `banks`)
    pub bank: String,
    /// Recipient account number (exactly 10 digits)
    pub account_number: String,
    pub narration: Option<String>,
    pub personal_note: Option<String>,
    /// Optional sender email for receipts; the transfer itself stays anonymous
    pub email: Option<String>,
}

/// The signed portion of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMetadata {
    pub txn_id: TxnId,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TransactionMetadata {
    /// Canonical byte form for MAC computation: fixed field order, no
    /// whitespace, RFC 3339 timestamps. Any change here invalidates every
    /// outstanding signature.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        use chrono::SecondsFormat;
        format!(
            "txn_id={}&amount={}&created_at={}&expires_at={}",
            self.txn_id,
            self.amount,
            self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .into_bytes()
    }

    /// Lazy expiry check; `now` is passed in so callers decide the clock.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A transaction session - the aggregate root, keyed by `SessionToken`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSession {
    pub token: SessionToken,
    pub txn_id: TxnId,
    pub metadata: TransactionMetadata,
    /// Hex HMAC over `metadata.canonical_bytes()`
    pub signature: String,
    pub details: TransactionDetails,
    pub status: SessionStatus,
    /// Gateway payment reference; set exactly once by the webhook claim
    pub payment_reference: Option<String>,
    /// Bank transfer reference; set on successful dispatch or manual completion
    pub transfer_reference: Option<String>,
    /// Once-only latch taken before invoking the transfer collaborator.
    /// This is what bounds dispatch to at-most-once per session.
    pub dispatch_started: bool,
    /// Why the automated dispatch failed (operator-visible)
    pub failure_reason: Option<String>,
    /// Operator-supplied refund reason
    pub refund_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionSession {
    pub fn new(
        token: SessionToken,
        metadata: TransactionMetadata,
        signature: String,
        details: TransactionDetails,
    ) -> Self {
        let txn_id = metadata.txn_id.clone();
        let updated_at = metadata.created_at;
        Self {
            token,
            txn_id,
            metadata,
            signature,
            details,
            status: SessionStatus::Pending,
            payment_reference: None,
            transfer_reference: None,
            dispatch_started: false,
            failure_reason: None,
            refund_reason: None,
            updated_at,
        }
    }
}

impl fmt::Display for TransactionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session[{}] amount={} bank={} status={}",
            self.txn_id, self.metadata.amount, self.details.bank, self.status
        )
    }
}
