//! Board commands: `dealboard board`, `move`, `create`.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use console::style;
use dealboard::board::{BoardController, LoadOutcome, MoveOutcome};
use dealboard::config::DealboardConfig;
use dealboard::{Columns, Deal, DealId, NewDeal, Stage};

fn connect(config: &DealboardConfig) -> Result<BoardController> {
    let api = config.http_api()?;
    Ok(BoardController::new(Arc::new(api), config.board_options()))
}

async fn load(config: &DealboardConfig) -> Result<BoardController> {
    let board = connect(config)?;
    match board.load_board().await {
        LoadOutcome::Failed { message } => bail!("Failed to load deals: {}", message),
        _ => Ok(board),
    }
}

fn describe(deal: &Deal) -> String {
    let mut line = format!("{}", style(deal.id.as_str()).bold());
    if let Some(title) = &deal.title {
        line.push_str(&format!("  {}", title));
    }
    if let Some(amount) = deal.amount {
        let currency = deal.currency.as_deref().unwrap_or("");
        line.push_str(&format!("  {}", style(format!("{:.2} {}", amount, currency).trim_end().to_string()).dim()));
    }
    if let Some(next) = deal.next_action_at {
        let due = format!("next: {}", next.format("%Y-%m-%d"));
        if next < Utc::now() && !deal.is_locked() {
            line.push_str(&format!("  {}", style(format!("{} (overdue)", due)).red()));
        } else {
            line.push_str(&format!("  {}", due));
        }
    }
    line
}

fn print_columns(columns: &Columns) {
    for column in &columns.columns {
        let header = format!("{} ({})", column.stage.as_str().to_uppercase(), column.deals.len());
        if column.locked {
            println!("{} {}", style(header).bold().dim(), style("locked").dim());
        } else {
            println!("{}", style(header).bold().cyan());
        }
        for deal in &column.deals {
            println!("  {}", describe(deal));
        }
        println!();
    }
}

pub async fn cmd_board(config: &DealboardConfig, json: bool) -> Result<()> {
    let board = load(config).await?;
    let columns = board.columns();
    if json {
        let out = serde_json::to_string_pretty(&columns).context("Failed to serialize board")?;
        println!("{}", out);
    } else {
        print_columns(&columns);
    }
    Ok(())
}

pub async fn cmd_move(config: &DealboardConfig, deal_id: &str, stage: &str) -> Result<()> {
    let target: Stage = stage.parse().map_err(anyhow::Error::msg)?;
    let board = load(config).await?;

    match board.complete_drag(&DealId::from(deal_id), Some(target)).await {
        MoveOutcome::Moved { deal_id, from, to } => {
            println!(
                "{} {} {} → {}",
                style("Moved").green().bold(),
                deal_id,
                from,
                to
            );
        }
        MoveOutcome::Unchanged { reason } => {
            println!(
                "{} {} ({:?})",
                style("Not moved:").yellow(),
                deal_id,
                reason
            );
        }
        MoveOutcome::Reverted { message, .. } => {
            bail!("Backend rejected the move of {} to {}: {}", deal_id, target, message);
        }
        MoveOutcome::Discarded => {}
    }
    Ok(())
}

pub async fn cmd_create(
    config: &DealboardConfig,
    title: Option<String>,
    amount: Option<f64>,
    currency: Option<String>,
) -> Result<()> {
    let board = connect(config)?;
    let deal = board
        .create_deal(NewDeal {
            title,
            amount,
            currency,
        })
        .await?;
    println!("{} {}", style("Created").green().bold(), describe(&deal));
    Ok(())
}
