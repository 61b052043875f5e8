//! CLI command implementations.
//!
//! | Module   | Commands handled            |
//! |----------|-----------------------------|
//! | `board`  | `Board`, `Move`, `Create`   |
//! | `merge`  | `Merge`                     |
//! | `serve`  | `Serve`                     |
//! | `config` | `Config`                    |

pub mod board;
pub mod config;
pub mod merge;
pub mod serve;

pub use board::{cmd_board, cmd_create, cmd_move};
pub use config::cmd_config;
pub use merge::cmd_merge;
pub use serve::cmd_serve;
