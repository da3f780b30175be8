//! Board document persistence: one document per board in `ludo_games`.
//!
//! Grounded on `ludo/board/board_dao.go`: every write is an upsert/partial
//! update against a single collection, keyed by `boardId`. All writes are
//! best-effort from the caller's point of view — failures are logged, not
//! propagated into the live game path (see the error handling design).

use async_trait::async_trait;
use bson::doc;
use chrono::{DateTime, Utc};
use mongodb::{options::UpdateOptions, Client, Collection};
use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};
use crate::model::RakeKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDoc {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub name: String,
    pub quadrant: String,
    #[serde(rename = "joinedAt")]
    pub joined_at: DateTime<Utc>,
    #[serde(rename = "disconnectedAt", skip_serializing_if = "Option::is_none")]
    pub disconnected_at: Option<DateTime<Utc>>,
    #[serde(rename = "reconnectedAt", skip_serializing_if = "Option::is_none")]
    pub reconnected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveDoc {
    #[serde(rename = "diceResult")]
    pub dice_result: i32,
    #[serde(rename = "initialPosition")]
    pub initial_position: i32,
    #[serde(rename = "finalPosition")]
    pub final_position: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardDoc {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "boardId")]
    pub board_id: String,
    #[serde(rename = "ticketAmount")]
    pub ticket_amount: i64,
    #[serde(rename = "rakeAmount")]
    pub rake_amount: i64,
    #[serde(rename = "rakeAmountType")]
    pub rake_amount_type: RakeKind,
    #[serde(rename = "winningAmount")]
    pub winning_amount: i64,
    pub status: String,
    #[serde(rename = "autoPlay")]
    pub auto_play: bool,
    #[serde(rename = "autoPlayTimer")]
    pub auto_play_timer: u64,
    #[serde(rename = "playersRequiredToStartGame")]
    pub players_required_to_start_game: u8,
    #[serde(rename = "startTime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "endTime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    pub players: Vec<PlayerDoc>,
    #[serde(rename = "pawnMoves")]
    pub pawn_moves: bson::Document,
}

pub enum ConnectionEvent {
    Disconnection,
    Reconnection,
}

/// Lowercases and dashes quadrant/pawn names for the nested `pawnMoves` path,
/// e.g. `QUADRANT_1` → `quadrant-1`, `QUADRANT_1_PAWN_3` → `pawn-3`.
pub fn format_quadrant_and_pawn_names(quadrant: &str, pawn: &str) -> (String, String) {
    let quadrant_index = quadrant.rsplit('_').next().unwrap_or("1");
    let pawn_index = pawn.rsplit('_').next().unwrap_or("1");
    (format!("quadrant-{}", quadrant_index.to_lowercase()), format!("pawn-{}", pawn_index.to_lowercase()))
}

#[async_trait]
pub trait BoardStore: Send + Sync {
    async fn insert_board(&self, doc: BoardDoc) -> GameResult<()>;
    async fn get_board_by_id(&self, board_id: &str) -> GameResult<Option<BoardDoc>>;
    async fn add_player(&self, board_id: &str, player: PlayerDoc) -> GameResult<()>;
    async fn update_connection_details(
        &self,
        board_id: &str,
        player_id: &str,
        event: ConnectionEvent,
        at: DateTime<Utc>,
    ) -> GameResult<()>;
    async fn update_status_and_start_time(&self, board_id: &str, status: &str, at: DateTime<Utc>) -> GameResult<()>;
    async fn update_status_and_end_time(&self, board_id: &str, status: &str, at: DateTime<Utc>) -> GameResult<()>;
    async fn update_winner(&self, board_id: &str, winner: &str, winning_amount: i64) -> GameResult<()>;
    async fn append_pawn_move(
        &self,
        board_id: &str,
        quadrant: &str,
        pawn: &str,
        initial_position: i32,
        final_position: i32,
        dice_result: i32,
        at: DateTime<Utc>,
    ) -> GameResult<()>;
}

pub struct MongoBoardStore {
    collection: Collection<bson::Document>,
}

impl MongoBoardStore {
    pub async fn connect(uri: &str, database: &str) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let collection = client.database(database).collection("ludo_games");
        Ok(Self { collection })
    }
}

#[async_trait]
impl BoardStore for MongoBoardStore {
    async fn insert_board(&self, doc: BoardDoc) -> GameResult<()> {
        let bson_doc = bson::to_document(&doc).map_err(|e| GameError::Persistence(e.to_string()))?;
        self.collection
            .insert_one(bson_doc, None)
            .await
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        Ok(())
    }

    async fn get_board_by_id(&self, board_id: &str) -> GameResult<Option<BoardDoc>> {
        let found = self
            .collection
            .find_one(doc! { "boardId": board_id }, None)
            .await
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        found
            .map(|d| bson::from_document(d).map_err(|e| GameError::Persistence(e.to_string())))
            .transpose()
    }

    async fn add_player(&self, board_id: &str, player: PlayerDoc) -> GameResult<()> {
        let player_doc = bson::to_document(&player).map_err(|e| GameError::Persistence(e.to_string()))?;
        self.collection
            .update_one(
                doc! { "boardId": board_id },
                doc! { "$push": { "players": player_doc } },
                None,
            )
            .await
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        Ok(())
    }

    async fn update_connection_details(
        &self,
        board_id: &str,
        player_id: &str,
        event: ConnectionEvent,
        at: DateTime<Utc>,
    ) -> GameResult<()> {
        let field = match event {
            ConnectionEvent::Disconnection => "disconnectedAt",
            ConnectionEvent::Reconnection => "reconnectedAt",
        };
        self.collection
            .update_one(
                doc! { "boardId": board_id, "players.playerId": player_id },
                doc! { "$set": { format!("players.$.{field}"): at } },
                None,
            )
            .await
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        Ok(())
    }

    async fn update_status_and_start_time(&self, board_id: &str, status: &str, at: DateTime<Utc>) -> GameResult<()> {
        self.collection
            .update_one(
                doc! { "boardId": board_id },
                doc! { "$set": { "status": status, "startTime": at } },
                None,
            )
            .await
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        Ok(())
    }

    async fn update_status_and_end_time(&self, board_id: &str, status: &str, at: DateTime<Utc>) -> GameResult<()> {
        self.collection
            .update_one(
                doc! { "boardId": board_id },
                doc! { "$set": { "status": status, "endTime": at } },
                None,
            )
            .await
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        Ok(())
    }

    async fn update_winner(&self, board_id: &str, winner: &str, winning_amount: i64) -> GameResult<()> {
        self.collection
            .update_one(
                doc! { "boardId": board_id },
                doc! { "$set": { "winner": winner, "winningAmount": winning_amount } },
                None,
            )
            .await
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        Ok(())
    }

    async fn append_pawn_move(
        &self,
        board_id: &str,
        quadrant: &str,
        pawn: &str,
        initial_position: i32,
        final_position: i32,
        dice_result: i32,
        at: DateTime<Utc>,
    ) -> GameResult<()> {
        let (q, p) = format_quadrant_and_pawn_names(quadrant, pawn);
        let path = format!("pawnMoves.{q}.{p}");
        let options = UpdateOptions::builder().upsert(true).build();
        self.collection
            .update_one(
                doc! { "boardId": board_id },
                doc! { "$push": { path: {
                    "diceResult": dice_result,
                    "initialPosition": initial_position,
                    "finalPosition": final_position,
                    "timestamp": at,
                } } },
                options,
            )
            .await
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        Ok(())
    }
}

/// No-op store used by unit and scenario tests, where a live Mongo instance
/// is unavailable.
#[derive(Default)]
pub struct NullBoardStore;

#[async_trait]
impl BoardStore for NullBoardStore {
    async fn insert_board(&self, _doc: BoardDoc) -> GameResult<()> {
        Ok(())
    }
    async fn get_board_by_id(&self, _board_id: &str) -> GameResult<Option<BoardDoc>> {
        Ok(None)
    }
    async fn add_player(&self, _board_id: &str, _player: PlayerDoc) -> GameResult<()> {
        Ok(())
    }
    async fn update_connection_details(
        &self,
        _board_id: &str,
        _player_id: &str,
        _event: ConnectionEvent,
        _at: DateTime<Utc>,
    ) -> GameResult<()> {
        Ok(())
    }
    async fn update_status_and_start_time(&self, _board_id: &str, _status: &str, _at: DateTime<Utc>) -> GameResult<()> {
        Ok(())
    }
    async fn update_status_and_end_time(&self, _board_id: &str, _status: &str, _at: DateTime<Utc>) -> GameResult<()> {
        Ok(())
    }
    async fn update_winner(&self, _board_id: &str, _winner: &str, _winning_amount: i64) -> GameResult<()> {
        Ok(())
    }
    async fn append_pawn_move(
        &self,
        _board_id: &str,
        _quadrant: &str,
        _pawn: &str,
        _initial_position: i32,
        _final_position: i32,
        _dice_result: i32,
        _at: DateTime<Utc>,
    ) -> GameResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_quadrant_and_pawn_path_segments() {
        let (q, p) = format_quadrant_and_pawn_names("QUADRANT_1", "QUADRANT_1_PAWN_3");
        assert_eq!(q, "quadrant-1");
        assert_eq!(p, "pawn-3");
    }
}
