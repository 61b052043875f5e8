//! Shared domain types for the deal pipeline board: canonical stages, the
//! deal record as read from the backend, and column bucketing.

pub mod columns;
pub mod deal;
pub mod stage;

pub use columns::{ColumnView, Columns, compute_columns};
pub use deal::{Deal, DealId, DealPage, NewDeal};
pub use stage::{DealStatus, LEGACY_STAGE_ALIASES, Stage, map_stage};
