//! Session status state machine.
//!
//! The status set is closed: every mutation in the engine goes through a CAS
//! that checks the edge below before writing, so an illegal transition can
//! never be persisted. Expiry is not a stored status; a `Pending` session
//! past its metadata expiry is simply ineligible for payment confirmation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transaction session status.
///
/// Legal edges:
/// - `Pending -> Paid` (webhook claim)
/// - `Paid -> Completed | Failed` (dispatch outcome), `Paid -> Flagged` (risk)
/// - `Flagged -> Approved | Rejected` (operator)
/// - `Approved -> Completed | Failed` (dispatch retry)
/// - `Failed -> Completed` (manual reference), `Failed -> Refunded`
/// - `Completed -> Refunded`
/// - `Rejected`, `Refunded`: terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created, awaiting payment confirmation
    Pending,
    /// Payment confirmed by the gateway; transfer not yet dispatched
    Paid,
    /// Held back by risk evaluation, awaiting operator decision
    Flagged,
    /// Transfer dispatch failed; operator remediation required
    Failed,
    /// Funds dispatched to the recipient
    Completed,
    /// Operator cleared a flagged session; dispatch may proceed
    Approved,
    /// Terminal: operator rejected a flagged session
    Rejected,
    /// Terminal: funds returned to the sender
    Refunded,
}

impl SessionStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Rejected | SessionStatus::Refunded)
    }

    /// Check whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Paid, Completed)
                | (Paid, Failed)
                | (Paid, Flagged)
                | (Flagged, Approved)
                | (Flagged, Rejected)
                | (Approved, Completed)
                | (Approved, Failed)
                | (Failed, Completed)
                | (Failed, Refunded)
                | (Completed, Refunded)
        )
    }

    /// States from which a transfer dispatch may be claimed.
    #[inline]
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, SessionStatus::Paid | SessionStatus::Approved)
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Paid => "paid",
            SessionStatus::Flagged => "flagged",
            SessionStatus::Failed => "failed",
            SessionStatus::Completed => "completed",
            SessionStatus::Approved => "approved",
            SessionStatus::Rejected => "rejected",
            SessionStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "paid" => Ok(SessionStatus::Paid),
            "flagged" => Ok(SessionStatus::Flagged),
            "failed" => Ok(SessionStatus::Failed),
            "completed" => Ok(SessionStatus::Completed),
            "approved" => Ok(SessionStatus::Approved),
            "rejected" => Ok(SessionStatus::Rejected),
            "refunded" => Ok(SessionStatus::Refunded),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionStatus::*;

    const ALL: [SessionStatus; 8] = [
        Pending, Paid, Flagged, Failed, Completed, Approved, Rejected, Refunded,
    ];

    #[test]
    fn test_terminal_states() {
        assert!(Rejected.is_terminal());
        assert!(Refunded.is_terminal());

        assert!(!Pending.is_terminal());
        assert!(!Paid.is_terminal());
        assert!(!Flagged.is_terminal());
        assert!(!Failed.is_terminal());
        assert!(!Completed.is_terminal());
        assert!(!Approved.is_terminal());
    }

    #[test]
    fn test_terminal_states_have_no_successors() {
        for from in [Rejected, Refunded] {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_pending_only_reaches_paid() {
        for to in ALL {
            assert_eq!(Pending.can_transition_to(to), to == Paid);
        }
    }

    #[test]
    fn test_refund_sources() {
        // refunded is reachable from completed or failed only
        for from in ALL {
            let legal = from == Completed || from == Failed;
            assert_eq!(from.can_transition_to(Refunded), legal, "{}", from);
        }
    }

    #[test]
    fn test_completed_only_refundable() {
        for to in ALL {
            assert_eq!(Completed.can_transition_to(to), to == Refunded);
        }
    }

    #[test]
    fn test_dispatchable() {
        assert!(Paid.is_dispatchable());
        assert!(Approved.is_dispatchable());
        assert!(!Pending.is_dispatchable());
        assert!(!Flagged.is_dispatchable());
        assert!(!Completed.is_dispatchable());
    }

    #[test]
    fn test_str_roundtrip() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<SessionStatus>(), Ok(status));
        }
        assert!("expired".parse::<SessionStatus>().is_err());
    }
}
