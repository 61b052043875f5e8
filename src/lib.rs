pub mod board;
pub mod client;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod logging;
pub mod merge;

pub use dealboard_common::{Columns, Deal, DealId, DealStatus, NewDeal, Stage, map_stage};
