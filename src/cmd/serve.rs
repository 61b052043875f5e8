//! Board gateway command: `dealboard serve`.

use std::sync::Arc;

use anyhow::Result;
use dealboard::board::BoardController;
use dealboard::config::DealboardConfig;
use dealboard::gateway::{ServerConfig, start_server};

pub async fn cmd_serve(config: &DealboardConfig, port: Option<u16>, dev: bool) -> Result<()> {
    let api = config.http_api()?;
    let board = Arc::new(BoardController::new(Arc::new(api), config.board_options()));

    start_server(
        ServerConfig {
            port: port.unwrap_or(config.toml.server.port),
            dev_mode: dev || config.toml.server.dev,
        },
        board,
    )
    .await
}
