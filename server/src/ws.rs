use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::broadcast::{ConnId, Connection};
use crate::input::InputEvent;
use crate::protocol::{InputMsg, ServerMsg};
use crate::registry::SessionRegistry;

/// Close code sent when the join credential is missing, unknown or expired.
pub const CLOSE_UNAUTHORIZED: u16 = 4001;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Shared app state passed to each handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub outbound_capacity: usize,
}

#[derive(Debug, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    token: String,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, params.token, app_state))
}

async fn close_unauthorized(sink: &mut futures_util::stream::SplitSink<WebSocket, Message>) {
    let frame = CloseFrame {
        code: CLOSE_UNAUTHORIZED,
        reason: "unauthorized".into(),
    };
    let _ = sink.send(Message::Close(Some(frame))).await;
}

async fn handle_socket(socket: WebSocket, token: String, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();

    let (session, player) = match app_state.registry.resolve(&token).await {
        Ok(found) => found,
        Err(e) => {
            tracing::debug!("Rejected connection: {}", e);
            close_unauthorized(&mut sink).await;
            return;
        }
    };

    let conn_id: ConnId = NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed);
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMsg>(app_state.outbound_capacity);
    let side = match session.join(player, Connection::new(conn_id, out_tx)).await {
        Ok(side) => side,
        Err(e) => {
            tracing::info!("Join to session {} refused: {}", session.id(), e);
            close_unauthorized(&mut sink).await;
            return;
        }
    };

    tracing::info!("Connection {} attached to session {} as side {}", conn_id, session.id(), side.id());

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        // malformed frames are dropped
                        if let Ok(input) = serde_json::from_str::<InputMsg>(&text) {
                            let event = InputEvent::from_msg(input, Utc::now().timestamp_millis());
                            if !session.input(player, event).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client
            out = out_rx.recv() => {
                match out {
                    Some(msg) => {
                        let json = match serde_json::to_string(&msg) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!("Failed to encode message: {}", e);
                                continue;
                            }
                        };
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    // the session released this connection
                    None => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    session.leave(player, conn_id).await;
    tracing::info!("Connection {} closed (side {})", conn_id, side.id());
}
