use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use dealboard_common::{DealId, NewDeal, Stage};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::board::{BoardController, LoadOutcome, PointerEvent};
use crate::errors::MergeError;
use crate::merge::{MergeSelection, MergeWorkflow};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub board: Arc<BoardController>,
    pub merge: Mutex<MergeWorkflow>,
}

impl AppState {
    pub fn new(board: Arc<BoardController>) -> Self {
        let merge = Mutex::new(MergeWorkflow::new(board.api()));
        Self { board, merge }
    }
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MoveDealRequest {
    pub stage: Option<String>,
}

#[derive(Deserialize)]
pub struct DrawerLinkRequest {
    pub link: String,
}

#[derive(Deserialize)]
pub struct MergeRequest {
    pub primary_id: String,
    #[serde(default)]
    pub duplicate_ids: Vec<String>,
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
}

fn default_dry_run() -> bool {
    true
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unprocessable(String),
    PreconditionFailed(String),
    BadGateway(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::PreconditionFailed(msg) => (StatusCode::PRECONDITION_FAILED, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<MergeError> for ApiError {
    fn from(err: MergeError) -> Self {
        let message = err.to_string();
        match err {
            MergeError::InvalidSelection(_) => ApiError::BadRequest(message),
            MergeError::PreviewRequired => ApiError::PreconditionFailed(message),
            MergeError::Conflict(_) => ApiError::Conflict(message),
            MergeError::Remote(_) => ApiError::BadGateway(message),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/board", get(get_board))
        .route("/api/board/reload", post(reload_board))
        .route("/api/board/drag", delete(cancel_drag))
        .route("/api/board/error", delete(dismiss_error))
        .route("/api/board/pointer", post(pointer_event))
        .route("/api/board/drawer", post(open_drawer_link).delete(close_drawer))
        .route("/api/deals", post(create_deal))
        .route("/api/deals/{id}", get(get_deal))
        .route("/api/deals/{id}/drag", post(begin_drag))
        .route("/api/deals/{id}/move", patch(move_deal))
        .route("/api/customers/merge", get(merge_status).post(merge_customers))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn get_board(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.board.snapshot())
}

async fn reload_board(State(state): State<SharedState>) -> impl IntoResponse {
    let outcome = state.board.load_board().await;
    let status = match outcome {
        LoadOutcome::Failed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };
    (status, Json(state.board.snapshot()))
}

async fn create_deal(
    State(state): State<SharedState>,
    Json(req): Json<NewDeal>,
) -> Result<impl IntoResponse, ApiError> {
    let deal = state
        .board
        .create_deal(req)
        .await
        .map_err(|e| ApiError::Unprocessable(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(deal)))
}

async fn get_deal(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deal = state
        .board
        .deal(&DealId::from(id.as_str()))
        .ok_or_else(|| ApiError::NotFound(format!("Deal {} not found", id)))?;
    Ok(Json(deal))
}

async fn begin_drag(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.board.begin_drag(&DealId::from(id.as_str())) {
        return Err(ApiError::Conflict(format!("Deal {} cannot be dragged", id)));
    }
    Ok(Json(state.board.snapshot()))
}

async fn cancel_drag(State(state): State<SharedState>) -> impl IntoResponse {
    state.board.cancel_drag();
    StatusCode::NO_CONTENT
}

async fn move_deal(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<MoveDealRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = req
        .stage
        .as_deref()
        .map(str::parse::<Stage>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let outcome = state.board.complete_drag(&DealId::from(id), target).await;
    Ok(Json(outcome))
}

async fn pointer_event(
    State(state): State<SharedState>,
    Json(event): Json<PointerEvent>,
) -> impl IntoResponse {
    let outcome = state.board.pointer(event).await;
    Json(serde_json::json!({
        "move": outcome,
        "board": state.board.snapshot(),
    }))
}

async fn dismiss_error(State(state): State<SharedState>) -> impl IntoResponse {
    state.board.dismiss_error();
    StatusCode::NO_CONTENT
}

async fn open_drawer_link(
    State(state): State<SharedState>,
    Json(req): Json<DrawerLinkRequest>,
) -> impl IntoResponse {
    state.board.restore_drawer(&req.link);
    let drawer = state.board.drawer();
    Json(serde_json::json!({
        "deal_id": drawer.deal_id,
        "query": drawer.to_query(),
    }))
}

async fn close_drawer(State(state): State<SharedState>) -> impl IntoResponse {
    state.board.close_drawer();
    StatusCode::NO_CONTENT
}

async fn merge_status(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.merge.lock().await.view())
}

async fn merge_customers(
    State(state): State<SharedState>,
    Json(req): Json<MergeRequest>,
) -> Result<Response, ApiError> {
    let selection = MergeSelection::new(req.primary_id, req.duplicate_ids)?;
    let mut workflow = state.merge.lock().await;
    workflow.select(selection);
    if req.dry_run {
        let preview = workflow.run_preview().await?;
        Ok(Json(preview).into_response())
    } else {
        let outcome = workflow.commit().await?;
        Ok(Json(outcome).into_response())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
