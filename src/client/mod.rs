//! Backend collaborator: the REST API that owns deals and customers.
//!
//! The board never talks to HTTP directly; it goes through [`DealApi`] so the
//! state machine can be driven by a test double. [`HttpDealApi`] is the real
//! implementation.

mod http;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use dealboard_common::{Deal, DealId, DealPage, NewDeal, Stage};

use crate::errors::ClientError;
use crate::merge::{MergeOutcome, MergePreview, MergeSelection};

pub use http::HttpDealApi;

/// Filter for the deal listing. An empty status means every status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealQuery {
    pub status: String,
    pub page_size: u32,
}

impl DealQuery {
    /// Everything the board shows: all statuses, one large page.
    pub fn board(page_size: u32) -> Self {
        Self {
            status: String::new(),
            page_size,
        }
    }
}

/// Abstraction over the backend for testability.
/// Real implementation: `HttpDealApi`. Test double: `FakeDealApi`.
#[async_trait]
pub trait DealApi: Send + Sync {
    async fn list_deals(&self, query: &DealQuery) -> Result<DealPage, ClientError>;

    async fn create_deal(&self, deal: &NewDeal) -> Result<Deal, ClientError>;

    /// Move a deal to a stage. Whatever the backend answers on success is
    /// ignored; the board already holds the new state.
    async fn move_deal(&self, id: &DealId, stage: Stage) -> Result<(), ClientError>;

    async fn preview_merge(&self, selection: &MergeSelection) -> Result<MergePreview, ClientError>;

    async fn commit_merge(&self, selection: &MergeSelection) -> Result<MergeOutcome, ClientError>;
}

/// Caller identity, handed to the client explicitly instead of being read
/// from ambient storage.
#[derive(Clone, Default)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.trim().is_empty()).then_some(token),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_query_has_no_status_filter() {
        let q = DealQuery::board(500);
        assert!(q.status.is_empty());
        assert_eq!(q.page_size, 500);
    }

    #[test]
    fn test_blank_token_is_anonymous() {
        assert!(Session::with_token("  ").token().is_none());
        assert_eq!(Session::with_token("abc").token(), Some("abc"));
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let out = format!("{:?}", Session::with_token("secret-token"));
        assert!(!out.contains("secret-token"));
        assert!(out.contains("redacted"));
    }
}
