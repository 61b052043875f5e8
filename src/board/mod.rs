//! The pipeline board: deals laid out in stage columns, moved by dragging.
//!
//! - `state`: the board's data and its synchronous transitions
//! - `controller`: drives those transitions against the backend
//! - `gesture`: turns pointer events into drags, drops and clicks
//! - `drawer`: the open deal drawer and its deep link

pub mod controller;
pub mod drawer;
pub mod gesture;
pub mod state;

pub use controller::{BoardController, BoardEvent, BoardOptions, DEFAULT_PAGE_SIZE};
pub use drawer::DrawerState;
pub use gesture::{DragController, DropTarget, GestureOutcome, Point, PointerEvent};
pub use state::{BoardSnapshot, BoardState, LoadOutcome, MoveOutcome, SkipReason};
