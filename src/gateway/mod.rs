//! Local HTTP surface over the board.
//!
//! ```text
//! ┌──────────┐   HTTP   ┌───────────────────────────────────────────────┐
//! │ Browser  │ ───────> │  server.rs  (axum Router, ServerConfig)       │
//! │          │ <─────── │    ├─ api.rs  (route handlers, AppState)      │
//! └──────────┘ WebSocket│    └─ ws.rs   (BoardEvent stream, keepalive)  │
//!                       │         │                                     │
//!                       │         v                                     │
//!                       │  board::BoardController ──> DealApi (backend) │
//!                       └───────────────────────────────────────────────┘
//! ```
//!
//! A drop arrives as `PATCH /api/deals/{id}/move`; the controller moves the
//! card at once, calls the backend, and either confirms or reverts. Every
//! step is pushed to connected WebSocket clients.

pub mod api;
pub mod server;
pub mod ws;

pub use server::{ServerConfig, build_router, start_server};
