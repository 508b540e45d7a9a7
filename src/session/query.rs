//! Read-only listing for the moderation dashboard.

use std::sync::Arc;

use super::status::SessionStatus;
use super::store::SessionStore;
use super::types::TransactionSession;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Listing filter. `page` is 1-based; `page_size` is clamped to
/// `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<SessionStatus>,
    pub search: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// One page of results plus the total match count across all pages.
#[derive(Debug, Clone)]
pub struct SessionPage {
    pub items: Vec<TransactionSession>,
    pub total: usize,
}

pub struct TransactionQuery {
    store: Arc<SessionStore>,
}

impl TransactionQuery {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// List sessions, newest first. Ordering is deterministic: creation time
    /// descending with txn id as the tie-break, so paging never skips or
    /// duplicates rows between requests.
    pub fn list(&self, filter: &ListFilter) -> SessionPage {
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matches: Vec<TransactionSession> = self
            .store
            .snapshot()
            .into_iter()
            .filter(|s| filter.status.is_none_or(|want| s.status == want))
            .filter(|s| needle.as_deref().is_none_or(|n| Self::matches(s, n)))
            .collect();

        matches.sort_by(|a, b| {
            b.metadata
                .created_at
                .cmp(&a.metadata.created_at)
                .then_with(|| b.txn_id.as_str().cmp(a.txn_id.as_str()))
        });

        let total = matches.len();
        let page_size = filter
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page = filter.page.unwrap_or(1).max(1);
        let items = matches
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        SessionPage { items, total }
    }

    /// Detail lookup for the admin view.
    pub fn get(&self, txn_id: &str) -> Option<TransactionSession> {
        self.store.get_by_txn_id(txn_id)
    }

    /// Case-insensitive substring match over the operator-searchable fields.
    fn matches(session: &TransactionSession, needle: &str) -> bool {
        session.txn_id.as_str().to_lowercase().contains(needle)
            || session.details.account_number.contains(needle)
            || session.details.bank.to_lowercase().contains(needle)
            || session
                .details
                .narration
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(needle))
    }
}
