//! Connection Manager: websocket upgrade, per-socket read loop, heartbeat,
//! and the glue routing inbound frames into `Board::dispatch` and outbound
//! `Outbound` values back out to the right sockets.
//!
//! Grounded on `messaging/socket` package's connection map (`playerId →
//! list<Connection>`, `boardId → list<playerId>`) and on the teacher's
//! `bin/server.rs` task-per-connection accept loop — the socket framing here
//! is JSON-over-WebSocket rather than the teacher's line-delimited TCP, but
//! the "one task per connection, shared state behind a lock" shape is the
//! same.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{mpsc, RwLock};

use crate::auth::AuthService;
use crate::board::{DisconnectOutcome, Outbound};
use crate::board_layout;
use crate::expectation::InboundEvent;
use crate::messages::{ErrorMessage, InboundEnvelope};
use crate::pool::BoardPool;

/// Everything a connection task needs: the board pool and the auth secret.
/// One `Arc<Server>` is shared across every connection task via axum state.
pub struct Server {
    pub pool: Arc<BoardPool>,
    pub auth: AuthService,
    /// playerId -> every currently open socket's outbound channel. A player
    /// may hold more than one live connection at once (e.g. a reconnect
    /// racing the old socket's teardown), so this is a list, not a slot.
    sockets: RwLock<HashMap<String, Vec<mpsc::UnboundedSender<Message>>>>,
}

impl Server {
    pub fn new(pool: Arc<BoardPool>, auth: AuthService) -> Self {
        Self {
            pool,
            auth,
            sockets: RwLock::new(HashMap::new()),
        }
    }

    async fn register(&self, player_id: &str, tx: mpsc::UnboundedSender<Message>) {
        self.sockets.write().await.entry(player_id.to_string()).or_default().push(tx);
    }

    /// Removes `tx` from `player_id`'s live connections. Returns `true` if
    /// this was the player's last remaining connection, in which case the
    /// caller should treat the player as disconnected.
    async fn unregister(&self, player_id: &str, tx: &mpsc::UnboundedSender<Message>) -> bool {
        let mut sockets = self.sockets.write().await;
        let Some(conns) = sockets.get_mut(player_id) else {
            return true;
        };
        conns.retain(|c| !c.same_channel(tx));
        let now_empty = conns.is_empty();
        if now_empty {
            sockets.remove(player_id);
        }
        now_empty
    }

    async fn send_direct(&self, player_id: &str, value: &serde_json::Value) {
        if let Some(conns) = self.sockets.read().await.get(player_id) {
            let text = value.to_string();
            for tx in conns {
                let _ = tx.send(Message::Text(text.clone()));
            }
        }
    }

    async fn deliver(&self, board_player_ids: &[String], outbound: Vec<Outbound>) {
        for msg in outbound {
            match msg {
                Outbound::Direct(player_id, value) => self.send_direct(&player_id, &value).await,
                Outbound::Broadcast(value) => {
                    for player_id in board_player_ids {
                        self.send_direct(player_id, &value).await;
                    }
                }
            }
        }
    }

    async fn board_player_ids(&self, board_id: &str) -> Vec<String> {
        match self.pool.get(board_id).await {
            Some(board) => board.read().await.players().iter().map(|p| p.player_id.clone()).collect(),
            None => Vec::new(),
        }
    }

    async fn send_error(&self, player_id: &str, code: i32, message: impl Into<String>) {
        let frame = serde_json::to_value(ErrorMessage::new(code, message)).expect("error message serializes");
        self.send_direct(player_id, &frame).await;
    }
}

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    #[serde(rename = "boardId")]
    board_id: String,
    #[allow(dead_code)]
    game: Option<String>,
}

/// `GET /ws?boardId=<id>&game=<name>` — verifies the bearer credential and
/// `walletAddress` header before ever upgrading, per the unauthenticated
/// handling rule in the error design.
pub async fn ws_handler(
    State(server): State<Arc<Server>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let token = match headers.get("Authorization").and_then(|v| v.to_str().ok()) {
        Some(t) => t.trim_start_matches("Bearer ").to_string(),
        None => return (StatusCode::UNAUTHORIZED, "missing Authorization header").into_response(),
    };
    let wallet_address = match headers.get("walletAddress").and_then(|v| v.to_str().ok()) {
        Some(w) => w.to_string(),
        None => return (StatusCode::UNAUTHORIZED, "missing walletAddress header").into_response(),
    };

    let (player_id, name) = match server.auth.verify_token(&token) {
        Ok(claim) => claim,
        Err(_) => return (StatusCode::UNAUTHORIZED, "invalid or expired credential").into_response(),
    };

    ws.on_upgrade(move |socket| {
        handle_socket(server, socket, query.board_id, player_id, name, wallet_address)
    })
    .into_response()
}

async fn handle_socket(
    server: Arc<Server>,
    socket: WebSocket,
    board_id: String,
    player_id: String,
    name: String,
    wallet_address: String,
) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    server.register(&player_id, tx.clone()).await;

    let write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    let Some(board) = server.pool.get(&board_id).await else {
        server.send_error(&player_id, 404, "board not found").await;
        let _ = tx.send(Message::Close(None));
        server.unregister(&player_id, &tx).await;
        drop(tx);
        let _ = write_task.await;
        return;
    };

    {
        let mut board = board.write().await;
        match board.add_player(&player_id, &name, &wallet_address).await {
            Ok(outbound) => {
                drop(board);
                let ids = server.board_player_ids(&board_id).await;
                server.deliver(&ids, outbound).await;
            }
            Err(err) => {
                server.send_error(&player_id, err.code(), err.to_string()).await;
            }
        }
    }

    let mut heartbeat = tokio::time::interval(std::time::Duration::from_secs(board_layout::HEARTBEAT_INTERVAL_SECS));
    heartbeat.tick().await;

    loop {
        let frame = tokio::select! {
            next = tokio::time::timeout(std::time::Duration::from_secs(board_layout::READ_DEADLINE_SECS), stream.next()) => {
                match next {
                    Ok(Some(Ok(frame))) => frame,
                    Ok(Some(Err(_))) | Ok(None) | Err(_) => break,
                }
            }
            _ = heartbeat.tick() => {
                if tx.send(Message::Ping(Vec::new())).is_err() {
                    break;
                }
                continue;
            }
        };

        match frame {
            Message::Text(text) => {
                if let Err((code, message)) = handle_frame(&server, &board, &board_id, &player_id, &text).await {
                    server.send_error(&player_id, code, message).await;
                }
            }
            Message::Ping(payload) => {
                let _ = tx.send(Message::Pong(payload));
            }
            Message::Close(_) => break,
            Message::Binary(_) => {
                server.send_error(&player_id, 400, "binary frames are not supported").await;
                break;
            }
            Message::Pong(_) => {}
        }
    }

    // Only treat this as a real disconnection once this was the player's
    // last live socket for this board — a player may hold more than one
    // open connection, and closing one of several must not trigger
    // Game.HandleDisconnection while another is still live.
    if server.unregister(&player_id, &tx).await {
        on_disconnect(&server, &board, &board_id, &player_id).await;
    }
    drop(tx);
    let _ = write_task.await;
}

async fn handle_frame(
    server: &Arc<Server>,
    board: &Arc<RwLock<crate::board::Board>>,
    board_id: &str,
    player_id: &str,
    text: &str,
) -> Result<(), (i32, String)> {
    let envelope: InboundEnvelope = serde_json::from_str(text).map_err(|e| (400, e.to_string()))?;
    let event = InboundEvent::parse(&envelope.event_name)
        .ok_or_else(|| (400, format!("unrecognised event {}", envelope.event_name)))?;

    let outbound = {
        let mut board = board.write().await;
        board
            .dispatch(event, player_id, envelope.payload)
            .await
            .map_err(|e| (e.code(), e.to_string()))?
    };

    let ids = server.board_player_ids(board_id).await;
    server.deliver(&ids, outbound).await;
    Ok(())
}

async fn on_disconnect(server: &Arc<Server>, board: &Arc<RwLock<crate::board::Board>>, board_id: &str, player_id: &str) {
    let outcome = {
        let mut board = board.write().await;
        board.handle_disconnection(player_id).await
    };

    let (outbound, outcome) = match outcome {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(%err, player_id, board_id, "disconnection handling failed");
            return;
        }
    };

    let ids = server.board_player_ids(board_id).await;
    server.deliver(&ids, outbound).await;

    if let DisconnectOutcome::StartGracePeriod { remaining_player_id } = outcome {
        let server = Arc::clone(server);
        let board = Arc::clone(board);
        let board_id = board_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(board_layout::GRACE_PERIOD_SECS)).await;
            let outbound = {
                let mut board = board.write().await;
                board.recheck_after_grace_period(&remaining_player_id).await
            };
            match outbound {
                Ok(outbound) => {
                    let ids = server.board_player_ids(&board_id).await;
                    server.deliver(&ids, outbound).await;
                }
                Err(err) => tracing::warn!(%err, board_id, "grace period recheck failed"),
            }
        });
    }
}
