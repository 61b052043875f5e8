//! Async driver for the board.
//!
//! Every operation takes the state lock for its synchronous steps only, then
//! releases it before talking to the backend. State changes are announced as
//! [`BoardEvent`]s on a broadcast channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dealboard_common::{Columns, Deal, DealId, NewDeal, Stage};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::drawer::DrawerState;
use super::gesture::{DEFAULT_ACTIVATION_DISTANCE, DragController, GestureOutcome, PointerEvent};
use super::state::{BoardSnapshot, BoardState, LoadOutcome, MoveOutcome, SkipReason};
use crate::client::{DealApi, DealQuery};
use crate::errors::BoardError;

/// Deals requested per load; the board shows everything on one page.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum BoardEvent {
    BoardLoaded { count: usize },
    LoadFailed { message: String },
    DragStarted { deal_id: DealId },
    DragCancelled { deal_id: Option<DealId> },
    /// Applied locally; the backend has not answered yet.
    DealMoved { deal_id: DealId, from: Stage, to: Stage },
    DealMoveConfirmed { deal_id: DealId, stage: Stage },
    DealMoveReverted { deal_id: DealId, message: String },
    DealCreated { deal: Deal },
    CreateFailed { message: String },
    ErrorDismissed,
    DrawerChanged { deal_id: Option<DealId> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardOptions {
    pub page_size: u32,
    pub activation_distance: f64,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
        }
    }
}

pub struct BoardController {
    api: Arc<dyn DealApi>,
    state: Mutex<BoardState>,
    gesture: Mutex<DragController>,
    events: broadcast::Sender<BoardEvent>,
    page_size: u32,
}

impl BoardController {
    pub fn new(api: Arc<dyn DealApi>, options: BoardOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            state: Mutex::new(BoardState::new()),
            gesture: Mutex::new(DragController::new(options.activation_distance)),
            events,
            page_size: options.page_size,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Sender side of the event stream, for bridges such as the WebSocket.
    pub fn events(&self) -> &broadcast::Sender<BoardEvent> {
        &self.events
    }

    pub fn api(&self) -> Arc<dyn DealApi> {
        self.api.clone()
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: BoardEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.state().snapshot()
    }

    pub fn columns(&self) -> Columns {
        self.state().columns()
    }

    pub fn deal(&self, id: &DealId) -> Option<Deal> {
        self.state().deal(id).cloned()
    }

    pub fn error(&self) -> Option<BoardError> {
        self.state().error().cloned()
    }

    // ── Load ────────────────────────────────────────────────────────

    /// Fetch every deal and replace the local list with the answer.
    pub async fn load_board(&self) -> LoadOutcome {
        let ticket = self.state().begin_load();
        let query = DealQuery::board(self.page_size);
        let result = self
            .api
            .list_deals(&query)
            .await
            .map(|page| page.items)
            .map_err(|e| e.user_message());
        let outcome = self.state().finish_load(ticket, result);

        match &outcome {
            LoadOutcome::Loaded { count } => {
                info!(count, "Board loaded");
                self.emit(BoardEvent::BoardLoaded { count: *count });
            }
            LoadOutcome::Failed { message } => {
                warn!(error = %message, "Board load failed");
                self.emit(BoardEvent::LoadFailed {
                    message: message.clone(),
                });
            }
            LoadOutcome::Stale => warn!("Dropping stale board load response"),
            LoadOutcome::Discarded => debug!("Board disposed; load response dropped"),
        }
        outcome
    }

    // ── Drag ────────────────────────────────────────────────────────

    pub fn begin_drag(&self, id: &DealId) -> bool {
        let started = self.state().begin_drag(id);
        if started {
            self.emit(BoardEvent::DragStarted {
                deal_id: id.clone(),
            });
        } else {
            debug!(deal_id = %id, "Drag refused");
        }
        started
    }

    pub fn cancel_drag(&self) {
        let subject = {
            let mut state = self.state();
            let subject = state.drag_subject().cloned();
            state.cancel_drag();
            subject
        };
        self.emit(BoardEvent::DragCancelled { deal_id: subject });
    }

    /// Drop a card on a stage: apply the move locally, then ask the backend.
    /// A rejection restores the board as it was before the drop.
    pub async fn complete_drag(&self, id: &DealId, target: Option<Stage>) -> MoveOutcome {
        let planned = self.state().plan_move(id, target);
        let pending = match planned {
            Ok(pending) => pending,
            Err(SkipReason::Disposed) => return MoveOutcome::Unchanged {
                reason: SkipReason::Disposed,
            },
            Err(reason) => {
                debug!(deal_id = %id, ?reason, "Drop ignored");
                self.emit(BoardEvent::DragCancelled {
                    deal_id: Some(id.clone()),
                });
                return MoveOutcome::Unchanged { reason };
            }
        };

        self.emit(BoardEvent::DealMoved {
            deal_id: pending.deal_id.clone(),
            from: pending.from,
            to: pending.target,
        });

        let result = self
            .api
            .move_deal(&pending.deal_id, pending.target)
            .await
            .map_err(|e| e.user_message());
        let target = pending.target;
        let outcome = self.state().settle_move(pending, result);

        match &outcome {
            MoveOutcome::Moved { deal_id, from, to } => {
                info!(deal_id = %deal_id, from = %from, to = %to, "Deal moved");
                self.emit(BoardEvent::DealMoveConfirmed {
                    deal_id: deal_id.clone(),
                    stage: *to,
                });
            }
            MoveOutcome::Reverted { deal_id, message } => {
                warn!(deal_id = %deal_id, target = %target, error = %message, "Move rejected; board restored");
                self.emit(BoardEvent::DealMoveReverted {
                    deal_id: deal_id.clone(),
                    message: message.clone(),
                });
            }
            MoveOutcome::Discarded => debug!(deal_id = %id, "Board disposed; move answer dropped"),
            MoveOutcome::Unchanged { .. } => {}
        }
        outcome
    }

    /// Feed a raw pointer event through the gesture layer and apply whatever
    /// it decides.
    pub async fn pointer(&self, event: PointerEvent) -> Option<MoveOutcome> {
        let decided = {
            let state = self.state();
            let mut gesture = self.gesture.lock().unwrap_or_else(PoisonError::into_inner);
            gesture.handle(event, &*state)
        };
        match decided {
            Some(outcome) => self.dispatch(outcome).await,
            None => None,
        }
    }

    /// Apply one gesture decision. Only a completed drag has a move outcome.
    pub async fn dispatch(&self, outcome: GestureOutcome) -> Option<MoveOutcome> {
        match outcome {
            GestureOutcome::BeginDrag { deal_id } => {
                self.begin_drag(&deal_id);
                None
            }
            GestureOutcome::OpenDrawer { deal_id } => {
                self.open_drawer(deal_id);
                None
            }
            GestureOutcome::CancelDrag { .. } => {
                self.cancel_drag();
                None
            }
            GestureOutcome::CompleteDrag { deal_id, target } => {
                Some(self.complete_drag(&deal_id, target).await)
            }
        }
    }

    // ── Create ──────────────────────────────────────────────────────

    pub async fn create_deal(&self, deal: NewDeal) -> Result<Deal, BoardError> {
        match self.api.create_deal(&deal).await {
            Ok(created) => {
                if self.state().insert_created(created.clone()) {
                    info!(deal_id = %created.id, "Deal created");
                    self.emit(BoardEvent::DealCreated {
                        deal: created.clone(),
                    });
                }
                Ok(created)
            }
            Err(e) => {
                let message = e.user_message();
                warn!(error = %message, "Deal creation failed");
                self.state().record_error(BoardError::Create {
                    message: message.clone(),
                });
                self.emit(BoardEvent::CreateFailed {
                    message: message.clone(),
                });
                Err(BoardError::Create { message })
            }
        }
    }

    // ── Errors, drawer, lifecycle ───────────────────────────────────

    pub fn dismiss_error(&self) {
        self.state().dismiss_error();
        self.emit(BoardEvent::ErrorDismissed);
    }

    pub fn drawer(&self) -> DrawerState {
        self.state().drawer().clone()
    }

    pub fn open_drawer(&self, id: DealId) {
        self.state().drawer_mut().open(id.clone());
        self.emit(BoardEvent::DrawerChanged { deal_id: Some(id) });
    }

    pub fn close_drawer(&self) {
        self.state().drawer_mut().close();
        self.emit(BoardEvent::DrawerChanged { deal_id: None });
    }

    /// Reopen the drawer named by a `?deal=<id>` link.
    pub fn restore_drawer(&self, link: &str) {
        let drawer = DrawerState::from_link(link);
        match drawer.deal_id {
            Some(id) => self.open_drawer(id),
            None => self.close_drawer(),
        }
    }

    /// Detach from the backend. Answers that arrive later are dropped.
    pub fn dispose(&self) {
        self.state().dispose();
        info!("Board disposed");
    }
}
