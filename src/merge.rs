//! Duplicate-customer merge: preview with a dry run, then commit.
//!
//! The backend performs the merge; this module enforces the order of
//! operations. A commit is only sent for the exact selection that was last
//! previewed, and a conflict answer throws the preview away so the user looks
//! at fresh data before trying again.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::DealApi;
use crate::errors::MergeError;

/// Primary customer plus the duplicates folded into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSelection {
    primary_id: String,
    duplicate_ids: Vec<String>,
}

impl MergeSelection {
    /// Duplicate ids are de-duplicated in first-seen order. The primary may
    /// not also be listed as a duplicate.
    pub fn new<I, S>(primary_id: impl Into<String>, duplicate_ids: I) -> Result<Self, MergeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let primary_id = primary_id.into().trim().to_string();
        if primary_id.is_empty() {
            return Err(MergeError::InvalidSelection(
                "primary customer id is empty".into(),
            ));
        }

        let mut duplicates: Vec<String> = Vec::new();
        for id in duplicate_ids {
            let id = id.into().trim().to_string();
            if id.is_empty() {
                continue;
            }
            if id == primary_id {
                return Err(MergeError::InvalidSelection(format!(
                    "customer {} cannot be merged into itself",
                    id
                )));
            }
            if !duplicates.contains(&id) {
                duplicates.push(id);
            }
        }
        if duplicates.is_empty() {
            return Err(MergeError::InvalidSelection(
                "select at least one duplicate customer".into(),
            ));
        }

        Ok(Self {
            primary_id,
            duplicate_ids: duplicates,
        })
    }

    pub fn primary_id(&self) -> &str {
        &self.primary_id
    }

    pub fn duplicate_ids(&self) -> &[String] {
        &self.duplicate_ids
    }
}

/// A field whose value differs between the primary and a duplicate. The
/// primary's value wins on merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConflict {
    pub field: String,
    #[serde(default)]
    pub primary_value: serde_json::Value,
    #[serde(default)]
    pub duplicate_value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_id: Option<String>,
}

/// Dry-run answer: what the merge would do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergePreview {
    pub primary_id: String,
    #[serde(default)]
    pub duplicate_ids: Vec<String>,
    #[serde(default)]
    pub conflicts: Vec<FieldConflict>,
    /// Related records that would be re-pointed at the primary, by kind.
    #[serde(default)]
    pub moved: BTreeMap<String, u64>,
}

impl MergePreview {
    pub fn empty(selection: &MergeSelection) -> Self {
        Self {
            primary_id: selection.primary_id.clone(),
            duplicate_ids: selection.duplicate_ids.clone(),
            conflicts: Vec::new(),
            moved: BTreeMap::new(),
        }
    }
}

/// Result of a committed merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub primary_id: String,
    #[serde(default)]
    pub merged_ids: Vec<String>,
    #[serde(default)]
    pub moved: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePhase {
    Idle,
    Selected,
    Previewed,
    Merged,
}

/// Serializable view of the workflow for the UI.
#[derive(Debug, Clone, Serialize)]
pub struct MergeView {
    pub phase: MergePhase,
    pub selection: Option<MergeSelection>,
    pub preview: Option<MergePreview>,
    pub error: Option<MergeError>,
}

pub struct MergeWorkflow {
    api: Arc<dyn DealApi>,
    selection: Option<MergeSelection>,
    /// Preview and the selection it was computed for.
    preview: Option<(MergeSelection, MergePreview)>,
    phase: MergePhase,
    error: Option<MergeError>,
}

impl MergeWorkflow {
    pub fn new(api: Arc<dyn DealApi>) -> Self {
        Self {
            api,
            selection: None,
            preview: None,
            phase: MergePhase::Idle,
            error: None,
        }
    }

    pub fn phase(&self) -> MergePhase {
        self.phase
    }

    pub fn error(&self) -> Option<&MergeError> {
        self.error.as_ref()
    }

    pub fn preview(&self) -> Option<&MergePreview> {
        self.preview.as_ref().map(|(_, p)| p)
    }

    pub fn view(&self) -> MergeView {
        MergeView {
            phase: self.phase,
            selection: self.selection.clone(),
            preview: self.preview().cloned(),
            error: self.error.clone(),
        }
    }

    /// Choose the customers to merge. Re-selecting the same customers keeps
    /// the current preview; any other selection discards it.
    pub fn select(&mut self, selection: MergeSelection) {
        if self.selection.as_ref() == Some(&selection) && self.phase != MergePhase::Merged {
            return;
        }
        self.selection = Some(selection);
        self.preview = None;
        self.error = None;
        self.phase = MergePhase::Selected;
    }

    pub fn reset(&mut self) {
        self.selection = None;
        self.preview = None;
        self.error = None;
        self.phase = MergePhase::Idle;
    }

    /// Ask the backend what merging the current selection would do.
    pub async fn run_preview(&mut self) -> Result<MergePreview, MergeError> {
        let selection = self.selection.clone().ok_or_else(|| {
            MergeError::InvalidSelection("no customers selected".into())
        })?;

        match self.api.preview_merge(&selection).await {
            Ok(preview) => {
                info!(
                    primary = selection.primary_id(),
                    duplicates = selection.duplicate_ids().len(),
                    conflicts = preview.conflicts.len(),
                    "merge preview ready"
                );
                self.preview = Some((selection, preview.clone()));
                self.error = None;
                self.phase = MergePhase::Previewed;
                Ok(preview)
            }
            Err(e) => {
                let err = MergeError::Remote(e.user_message());
                warn!(primary = selection.primary_id(), error = %e, "merge preview failed");
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Perform the merge previewed for the current selection.
    pub async fn commit(&mut self) -> Result<MergeOutcome, MergeError> {
        let previewed = matches!(
            (&self.selection, &self.preview),
            (Some(current), Some((previewed, _))) if current == previewed
        );
        let selection = match self.selection.clone() {
            Some(selection) if previewed => selection,
            _ => {
                self.error = Some(MergeError::PreviewRequired);
                return Err(MergeError::PreviewRequired);
            }
        };

        match self.api.commit_merge(&selection).await {
            Ok(outcome) => {
                info!(
                    primary = outcome.primary_id.as_str(),
                    merged = outcome.merged_ids.len(),
                    "customers merged"
                );
                self.preview = None;
                self.error = None;
                self.phase = MergePhase::Merged;
                Ok(outcome)
            }
            Err(e) if e.is_conflict() => {
                let err = MergeError::Conflict(e.user_message());
                warn!(primary = selection.primary_id(), error = %e, "merge conflict, preview discarded");
                self.preview = None;
                self.phase = MergePhase::Selected;
                self.error = Some(err.clone());
                Err(err)
            }
            Err(e) => {
                let err = MergeError::Remote(e.user_message());
                warn!(primary = selection.primary_id(), error = %e, "merge failed");
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }
}
