//! Typed error hierarchy for dealboard.
//!
//! - `ClientError`: failures talking to the backend REST API
//! - `BoardError`: failures recorded on the board for the user to see
//! - `MergeError`: customer merge workflow failures

use dealboard_common::{DealId, Stage};
use serde::Serialize;
use thiserror::Error;

/// Errors from the backend collaborator.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request to backend failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to decode backend response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid backend URL '{url}'")]
    InvalidUrl { url: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The backend refused because the records changed underneath the
    /// request (HTTP 409).
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Text fit for an error banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Errors surfaced on the board. Every backend failure ends up as one of
/// these instead of escaping the controller.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardError {
    #[error("Failed to load deals: {message}")]
    Load { message: String },

    #[error("Could not move deal {deal_id} to {target}: {message}")]
    Transition {
        deal_id: DealId,
        target: Stage,
        message: String,
    },

    #[error("Failed to create deal: {message}")]
    Create { message: String },
}

/// Errors from the customer merge workflow.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum MergeError {
    #[error("Invalid merge selection: {0}")]
    InvalidSelection(String),

    #[error("Run a dry-run preview of this selection before merging")]
    PreviewRequired,

    #[error("Merge conflict: {0}")]
    Conflict(String),

    #[error("Merge failed: {0}")]
    Remote(String),
}
