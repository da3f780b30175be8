//! The lobby's one REST endpoint, served by the same process and state as
//! the websocket server — no separate service.
//!
//! Grounded on `lobby/ludo_lobby_route.go`'s board-list handler.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::server::Server;

pub fn router(server: Arc<Server>) -> Router {
    Router::new()
        .route("/api/ludo/board-list", get(board_list))
        .with_state(server)
}

async fn board_list(State(server): State<Arc<Server>>) -> Json<crate::messages::BoardListResponse> {
    Json(server.pool.board_list().await)
}
