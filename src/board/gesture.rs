//! Pointer gesture interpretation.
//!
//! A pointer-down on a card ends in exactly one of: a click (opens the deal
//! drawer), a drag that completes on a drop target, a drag abandoned outside
//! any target, or nothing at all (a locked card moved past the threshold).
//! The controller here only reads the board; it hands its decisions back as
//! [`GestureOutcome`]s.

use dealboard_common::{Columns, DealId, Stage};
use serde::{Deserialize, Serialize};

use super::state::{BoardSnapshot, BoardState};

/// Default drag activation distance, in pixels.
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// What the pointer was over when released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DropTarget {
    Card(DealId),
    Column(Stage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { card: DealId, at: Point },
    Move { at: Point },
    Up { at: Point, over: Option<DropTarget> },
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureOutcome {
    BeginDrag { deal_id: DealId },
    OpenDrawer { deal_id: DealId },
    CompleteDrag { deal_id: DealId, target: Option<Stage> },
    CancelDrag { deal_id: DealId },
}

/// Read access to the board that gestures need.
pub trait BoardLookup {
    fn column_of(&self, id: &DealId) -> Option<Stage>;

    fn is_draggable(&self, id: &DealId) -> bool;
}

impl BoardLookup for BoardState {
    fn column_of(&self, id: &DealId) -> Option<Stage> {
        self.current_column(id)
    }

    fn is_draggable(&self, id: &DealId) -> bool {
        BoardState::is_draggable(self, id)
    }
}

impl BoardLookup for BoardSnapshot {
    fn column_of(&self, id: &DealId) -> Option<Stage> {
        self.columns.stage_of(id)
    }

    fn is_draggable(&self, id: &DealId) -> bool {
        !self.in_flight.contains(id) && self.column_of(id).is_some_and(|s| !s.is_terminal())
    }
}

impl BoardLookup for Columns {
    fn column_of(&self, id: &DealId) -> Option<Stage> {
        self.stage_of(id)
    }

    fn is_draggable(&self, id: &DealId) -> bool {
        self.stage_of(id).is_some_and(|s| !s.is_terminal())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    Pressed {
        card: DealId,
        origin: Point,
        draggable: bool,
        moved: bool,
    },
    Dragging {
        card: DealId,
    },
}

#[derive(Debug, Clone)]
pub struct DragController {
    activation_distance: f64,
    phase: Phase,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVATION_DISTANCE)
    }
}

impl DragController {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            activation_distance: activation_distance.max(0.0),
            phase: Phase::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    pub fn handle(&mut self, event: PointerEvent, board: &impl BoardLookup) -> Option<GestureOutcome> {
        match event {
            PointerEvent::Down { card, at } => {
                // A stray pointer-down mid-drag drops the old gesture.
                let abandoned = self.take_drag();
                if board.column_of(&card).is_some() {
                    self.phase = Phase::Pressed {
                        draggable: board.is_draggable(&card),
                        card,
                        origin: at,
                        moved: false,
                    };
                }
                abandoned
            }
            PointerEvent::Move { at } => {
                let Phase::Pressed {
                    card,
                    origin,
                    draggable,
                    moved,
                } = &mut self.phase
                else {
                    return None;
                };
                if origin.distance(&at) <= self.activation_distance {
                    return None;
                }
                *moved = true;
                if !*draggable {
                    return None;
                }
                let deal_id = card.clone();
                self.phase = Phase::Dragging {
                    card: deal_id.clone(),
                };
                Some(GestureOutcome::BeginDrag { deal_id })
            }
            PointerEvent::Up { at: _, over } => {
                match std::mem::replace(&mut self.phase, Phase::Idle) {
                    Phase::Idle => None,
                    Phase::Pressed {
                        card, moved: false, ..
                    } => Some(GestureOutcome::OpenDrawer { deal_id: card }),
                    Phase::Pressed { .. } => None,
                    Phase::Dragging { card } => Some(match over {
                        None => GestureOutcome::CancelDrag { deal_id: card },
                        Some(target) => GestureOutcome::CompleteDrag {
                            target: resolve_drop(&target, board),
                            deal_id: card,
                        },
                    }),
                }
            }
            PointerEvent::Cancel => self.take_drag(),
        }
    }

    fn take_drag(&mut self) -> Option<GestureOutcome> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Dragging { card } => Some(GestureOutcome::CancelDrag { deal_id: card }),
            _ => None,
        }
    }
}

/// Stage a drop lands in: a card's current column, or the column itself.
pub fn resolve_drop(target: &DropTarget, board: &impl BoardLookup) -> Option<Stage> {
    match target {
        DropTarget::Card(id) => board.column_of(id),
        DropTarget::Column(stage) => Some(*stage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealboard_common::{Deal, compute_columns};

    fn board() -> Columns {
        compute_columns(&[
            Deal::new("d1", Stage::Lead),
            Deal::new("d2", Stage::Won),
            Deal::new("d3", Stage::Proposal),
        ])
    }

    fn down(card: &str) -> PointerEvent {
        PointerEvent::Down {
            card: DealId::new(card),
            at: Point::new(10.0, 10.0),
        }
    }

    fn move_to(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move { at: Point::new(x, y) }
    }

    fn up(over: Option<DropTarget>) -> PointerEvent {
        PointerEvent::Up {
            at: Point::new(200.0, 10.0),
            over,
        }
    }

    #[test]
    fn test_click_opens_drawer() {
        let b = board();
        let mut dc = DragController::default();
        assert_eq!(dc.handle(down("d1"), &b), None);
        assert_eq!(dc.handle(move_to(12.0, 11.0), &b), None);
        assert_eq!(
            dc.handle(up(Some(DropTarget::Column(Stage::Proposal))), &b),
            Some(GestureOutcome::OpenDrawer {
                deal_id: DealId::new("d1")
            })
        );
    }

    #[test]
    fn test_drag_past_threshold_completes_on_column() {
        let b = board();
        let mut dc = DragController::default();
        dc.handle(down("d1"), &b);
        assert_eq!(
            dc.handle(move_to(30.0, 10.0), &b),
            Some(GestureOutcome::BeginDrag {
                deal_id: DealId::new("d1")
            })
        );
        assert!(dc.is_dragging());
        // Further movement emits nothing new.
        assert_eq!(dc.handle(move_to(80.0, 10.0), &b), None);
        assert_eq!(
            dc.handle(up(Some(DropTarget::Column(Stage::Contacted))), &b),
            Some(GestureOutcome::CompleteDrag {
                deal_id: DealId::new("d1"),
                target: Some(Stage::Contacted)
            })
        );
        assert!(!dc.is_dragging());
    }

    #[test]
    fn test_drop_on_card_uses_that_cards_column() {
        let b = board();
        let mut dc = DragController::default();
        dc.handle(down("d1"), &b);
        dc.handle(move_to(30.0, 30.0), &b);
        assert_eq!(
            dc.handle(up(Some(DropTarget::Card(DealId::new("d3")))), &b),
            Some(GestureOutcome::CompleteDrag {
                deal_id: DealId::new("d1"),
                target: Some(Stage::Proposal)
            })
        );
    }

    #[test]
    fn test_drop_on_unknown_card_has_no_target() {
        let b = board();
        let mut dc = DragController::default();
        dc.handle(down("d1"), &b);
        dc.handle(move_to(30.0, 30.0), &b);
        assert_eq!(
            dc.handle(up(Some(DropTarget::Card(DealId::new("gone")))), &b),
            Some(GestureOutcome::CompleteDrag {
                deal_id: DealId::new("d1"),
                target: None
            })
        );
    }

    #[test]
    fn test_release_outside_targets_cancels() {
        let b = board();
        let mut dc = DragController::default();
        dc.handle(down("d1"), &b);
        dc.handle(move_to(30.0, 30.0), &b);
        assert_eq!(
            dc.handle(up(None), &b),
            Some(GestureOutcome::CancelDrag {
                deal_id: DealId::new("d1")
            })
        );
    }

    #[test]
    fn test_locked_card_never_drags() {
        let b = board();
        let mut dc = DragController::default();
        dc.handle(down("d2"), &b);
        assert_eq!(dc.handle(move_to(100.0, 100.0), &b), None);
        assert!(!dc.is_dragging());
        assert_eq!(dc.handle(up(Some(DropTarget::Column(Stage::Lead))), &b), None);
    }

    #[test]
    fn test_locked_card_click_still_opens_drawer() {
        let b = board();
        let mut dc = DragController::default();
        dc.handle(down("d2"), &b);
        assert_eq!(
            dc.handle(up(None), &b),
            Some(GestureOutcome::OpenDrawer {
                deal_id: DealId::new("d2")
            })
        );
    }

    #[test]
    fn test_no_gesture_for_any_terminal_card() {
        let deals: Vec<Deal> = Stage::ALL
            .iter()
            .enumerate()
            .map(|(i, s)| Deal::new(format!("c{}", i), *s))
            .collect();
        let b = compute_columns(&deals);
        for deal in deals.iter().filter(|d| d.is_locked()) {
            let mut dc = DragController::default();
            dc.handle(
                PointerEvent::Down {
                    card: deal.id.clone(),
                    at: Point::default(),
                },
                &b,
            );
            assert_eq!(dc.handle(move_to(50.0, 50.0), &b), None);
        }
    }

    #[test]
    fn test_pointer_down_on_unknown_card_is_ignored() {
        let b = board();
        let mut dc = DragController::default();
        dc.handle(down("ghost"), &b);
        assert_eq!(dc.handle(move_to(50.0, 50.0), &b), None);
        assert_eq!(dc.handle(up(None), &b), None);
    }

    #[test]
    fn test_cancel_mid_drag() {
        let b = board();
        let mut dc = DragController::default();
        dc.handle(down("d3"), &b);
        dc.handle(move_to(40.0, 10.0), &b);
        assert_eq!(
            dc.handle(PointerEvent::Cancel, &b),
            Some(GestureOutcome::CancelDrag {
                deal_id: DealId::new("d3")
            })
        );
        assert_eq!(dc.handle(PointerEvent::Cancel, &b), None);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let b = board();
        let mut dc = DragController::new(50.0);
        dc.handle(down("d1"), &b);
        assert_eq!(dc.handle(move_to(40.0, 10.0), &b), None);
        assert!(dc.handle(move_to(70.0, 10.0), &b).is_some());
    }

    #[test]
    fn test_pointer_event_wire_format() {
        let event: PointerEvent = serde_json::from_str(
            r#"{"type":"up","at":{"x":1.0,"y":2.0},"over":{"kind":"column","id":"won"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            PointerEvent::Up {
                at: Point::new(1.0, 2.0),
                over: Some(DropTarget::Column(Stage::Won))
            }
        );
    }
}
