//! Board state machine.
//!
//! `BoardState` holds everything the board renders and exposes the
//! transitions as plain synchronous methods. The network half of each
//! operation lives in [`super::controller`]; this module never awaits, so
//! every transition can be exercised directly in tests.

use std::collections::BTreeSet;

use dealboard_common::{Columns, Deal, DealId, Stage, compute_columns};
use serde::Serialize;

use super::drawer::DrawerState;
use crate::errors::BoardError;

/// Identifies one `load_board` request. Only the newest ticket may apply
/// its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// What happened to a load response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded { count: usize },
    Failed { message: String },
    /// A newer load was started before this one answered.
    Stale,
    /// The board was disposed before the answer arrived.
    Discarded,
}

/// Why a drop did not produce a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoTarget,
    UnknownDeal,
    SameColumn,
    Locked,
    InFlight,
    Disposed,
}

/// A move that has been applied locally and awaits the backend.
#[derive(Debug, Clone)]
pub struct PendingMove {
    pub deal_id: DealId,
    pub from: Stage,
    pub target: Stage,
    previous: Deal,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    Unchanged { reason: SkipReason },
    Moved { deal_id: DealId, from: Stage, to: Stage },
    Reverted { deal_id: DealId, message: String },
    Discarded,
}

/// Serializable picture of the board for renderers.
#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    pub columns: Columns,
    pub loading: bool,
    pub error: Option<BoardError>,
    pub drag_subject: Option<DealId>,
    pub in_flight: Vec<DealId>,
    /// Cards in terminal columns; these never start a drag.
    pub locked: Vec<DealId>,
    pub drawer: DrawerState,
}

#[derive(Debug)]
pub struct BoardState {
    deals: Vec<Deal>,
    loading: bool,
    error: Option<BoardError>,
    drag_subject: Option<DealId>,
    in_flight: BTreeSet<DealId>,
    load_seq: u64,
    /// Bumped whenever a load replaces the list.
    generation: u64,
    mounted: bool,
    drawer: DrawerState,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    pub fn new() -> Self {
        Self {
            deals: Vec::new(),
            loading: false,
            error: None,
            drag_subject: None,
            in_flight: BTreeSet::new(),
            load_seq: 0,
            generation: 0,
            mounted: true,
            drawer: DrawerState::default(),
        }
    }

    pub fn with_deals(deals: Vec<Deal>) -> Self {
        Self {
            deals,
            ..Self::new()
        }
    }

    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    pub fn deal(&self, id: &DealId) -> Option<&Deal> {
        self.deals.iter().find(|d| &d.id == id)
    }

    pub fn columns(&self) -> Columns {
        compute_columns(&self.deals)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&BoardError> {
        self.error.as_ref()
    }

    pub fn drag_subject(&self) -> Option<&DealId> {
        self.drag_subject.as_ref()
    }

    pub fn is_in_flight(&self, id: &DealId) -> bool {
        self.in_flight.contains(id)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn drawer(&self) -> &DrawerState {
        &self.drawer
    }

    pub fn drawer_mut(&mut self) -> &mut DrawerState {
        &mut self.drawer
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            columns: self.columns(),
            loading: self.loading,
            error: self.error.clone(),
            drag_subject: self.drag_subject.clone(),
            in_flight: self.in_flight.iter().cloned().collect(),
            locked: self
                .deals
                .iter()
                .filter(|d| d.display_stage().is_terminal())
                .map(|d| d.id.clone())
                .collect(),
            drawer: self.drawer.clone(),
        }
    }

    /// Column currently holding the deal. Same answer as looking the deal up
    /// in [`Self::columns`], without building them.
    pub fn current_column(&self, id: &DealId) -> Option<Stage> {
        self.deal(id).map(Deal::display_stage)
    }

    /// Whether a drag may start on this card.
    pub fn is_draggable(&self, id: &DealId) -> bool {
        self.mounted
            && !self.in_flight.contains(id)
            && self.current_column(id).is_some_and(|stage| !stage.is_terminal())
    }

    // ── Load ────────────────────────────────────────────────────────

    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_seq += 1;
        self.loading = true;
        LoadTicket(self.load_seq)
    }

    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<Deal>, String>) -> LoadOutcome {
        if !self.mounted {
            return LoadOutcome::Discarded;
        }
        if ticket.0 != self.load_seq {
            return LoadOutcome::Stale;
        }
        self.loading = false;
        match result {
            Ok(deals) => {
                let count = deals.len();
                self.deals = deals;
                self.generation += 1;
                self.error = None;
                LoadOutcome::Loaded { count }
            }
            Err(message) => {
                self.error = Some(BoardError::Load {
                    message: message.clone(),
                });
                LoadOutcome::Failed { message }
            }
        }
    }

    // ── Drag ────────────────────────────────────────────────────────

    /// Record the card being dragged. Refused for cards that cannot be
    /// dragged; nothing else changes either way.
    pub fn begin_drag(&mut self, id: &DealId) -> bool {
        if !self.is_draggable(id) {
            return false;
        }
        self.drag_subject = Some(id.clone());
        true
    }

    pub fn cancel_drag(&mut self) {
        self.drag_subject = None;
    }

    /// First half of a drop: validate, snapshot, and apply the move locally.
    ///
    /// The current stage comes from the card's column rather than a stored
    /// label, so a card whose earlier move is still settling is judged by
    /// where the user sees it.
    pub fn plan_move(&mut self, id: &DealId, target: Option<Stage>) -> Result<PendingMove, SkipReason> {
        if !self.mounted {
            return Err(SkipReason::Disposed);
        }
        self.drag_subject = None;

        let target = target.ok_or(SkipReason::NoTarget)?;
        let from = self.current_column(id).ok_or(SkipReason::UnknownDeal)?;
        if from == target {
            return Err(SkipReason::SameColumn);
        }
        if from.is_terminal() {
            return Err(SkipReason::Locked);
        }
        if self.in_flight.contains(id) {
            return Err(SkipReason::InFlight);
        }

        let Some(deal) = self.deals.iter_mut().find(|d| &d.id == id) else {
            return Err(SkipReason::UnknownDeal);
        };
        let previous = deal.clone();
        deal.set_stage(target);
        self.in_flight.insert(id.clone());

        Ok(PendingMove {
            deal_id: id.clone(),
            from,
            target,
            previous,
            generation: self.generation,
        })
    }

    /// Second half of a drop, once the backend has answered. A rejection
    /// puts the moved deal's stage and status back as they were before the
    /// drop and leaves every other deal alone. If a load has replaced the
    /// list in the meantime, the loaded copy already reflects the backend
    /// and is kept.
    pub fn settle_move(&mut self, pending: PendingMove, result: Result<(), String>) -> MoveOutcome {
        if !self.mounted {
            return MoveOutcome::Discarded;
        }
        self.in_flight.remove(&pending.deal_id);
        match result {
            Ok(()) => MoveOutcome::Moved {
                deal_id: pending.deal_id,
                from: pending.from,
                to: pending.target,
            },
            Err(message) => {
                if pending.generation == self.generation
                    && let Some(deal) = self.deals.iter_mut().find(|d| d.id == pending.deal_id)
                {
                    deal.stage = pending.previous.stage;
                    deal.status = pending.previous.status;
                }
                self.error = Some(BoardError::Transition {
                    deal_id: pending.deal_id.clone(),
                    target: pending.target,
                    message: message.clone(),
                });
                MoveOutcome::Reverted {
                    deal_id: pending.deal_id,
                    message,
                }
            }
        }
    }

    // ── Misc ────────────────────────────────────────────────────────

    /// Add a freshly created deal. Returns false if the board is gone.
    pub fn insert_created(&mut self, deal: Deal) -> bool {
        if !self.mounted {
            return false;
        }
        self.deals.push(deal);
        self.error = None;
        true
    }

    pub fn record_error(&mut self, error: BoardError) {
        if self.mounted {
            self.error = Some(error);
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Stop accepting answers. Anything that settles afterwards is dropped.
    pub fn dispose(&mut self) {
        self.mounted = false;
        self.drag_subject = None;
    }
}
