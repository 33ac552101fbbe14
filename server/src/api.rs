//! HTTP surface: session creation and the WebSocket endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use pong_shared::config::GameConfig;
use pong_shared::protocol::CreateGameResponse;
use serde_json::{json, Value};

use crate::ws::{ws_handler, AppState};

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/internal/games/create", post(create_game))
        .route("/ws", get(ws_handler))
        .with_state(app_state)
}

async fn create_game(
    State(app_state): State<AppState>,
    payload: Result<Json<GameConfig>, JsonRejection>,
) -> Result<Json<CreateGameResponse>, (StatusCode, Json<Value>)> {
    // malformed bodies get the same 400 shape as invalid configurations
    let Json(config) = payload.map_err(|rejection| {
        tracing::info!("Rejected game creation body: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": rejection.body_text() })),
        )
    })?;
    match app_state.registry.create(config).await {
        Ok(created) => Ok(Json(created)),
        Err(e) => {
            tracing::info!("Rejected game creation: {}", e);
            Err((StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))))
        }
    }
}
