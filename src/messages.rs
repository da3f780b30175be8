//! Outbound/inbound wire message shapes. One plain struct per event, each
//! carrying its own `eventName` literal — the collapsed replacement for the
//! original's per-class hand-written `ToJSON`/`ToObject` methods.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------- inbound

/// Generic inbound envelope: every client message carries `eventName` plus
/// whatever payload fields its method needs. We deserialize into this first
/// to read `eventName`, then re-deserialize into the specific payload type.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(flatten)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectQuadrantPayload {
    pub quadrant: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovePawnPayload {
    pub quadrant: String,
    pub pawn: String,
    pub steps: i32,
}

// --------------------------------------------------------------- outbound

#[derive(Debug, Clone, Serialize)]
pub struct QuadrantLayout {
    pub name: String,
    pub color: String,
    pub pawns: Vec<String>,
    pub path: Vec<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameInitializeMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    #[serde(rename = "safePositions")]
    pub safe_positions: Vec<i32>,
    pub quadrants: Vec<QuadrantLayout>,
    #[serde(rename = "autoPlay")]
    pub auto_play: bool,
    #[serde(rename = "autoPlayTimer")]
    pub auto_play_timer: u64,
    #[serde(rename = "playersRequiredToStartGame")]
    pub players_required_to_start_game: u8,
    #[serde(rename = "ticketAmount")]
    pub ticket_amount: i64,
    #[serde(rename = "playerSelectingTheQuadrant")]
    pub player_selecting_the_quadrant: Option<String>,
}

impl GameInitializeMessage {
    pub const EVENT: &'static str = "Game.Initialize";
}

#[derive(Debug, Clone, Serialize)]
pub struct WaitingPlayerInfo {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardWaitingPlayersMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    #[serde(rename = "waitingPlayers")]
    pub waiting_players: Vec<WaitingPlayerInfo>,
    #[serde(rename = "newPlayer")]
    pub new_player: WaitingPlayerInfo,
    #[serde(rename = "playerSelectingQuadrant")]
    pub player_selecting_quadrant: Option<String>,
}

impl BoardWaitingPlayersMessage {
    pub const EVENT: &'static str = "Board.WaitingPlayers";
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardSelectingQuadrantMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    pub player: String,
}

impl BoardSelectingQuadrantMessage {
    pub const EVENT: &'static str = "Board.SelectingQuadrant";
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectQuadrantMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    pub quadrants: Vec<String>,
    #[serde(rename = "responseCode")]
    pub response_code: i32,
}

impl SelectQuadrantMessage {
    pub const EVENT: &'static str = "Select.Quadrant";
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantInfo {
    pub player: WaitingPlayerInfo,
    pub quadrant: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardJoinedMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    pub participants: Vec<ParticipantInfo>,
    #[serde(rename = "playerSelectingTheQuadrant")]
    pub player_selecting_the_quadrant: Option<String>,
}

impl BoardJoinedMessage {
    pub const EVENT: &'static str = "Board.Joined";
}

#[derive(Debug, Clone, Serialize)]
pub struct GameStartMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
}

impl GameStartMessage {
    pub const EVENT: &'static str = "Game.Start";

    pub fn new() -> Self {
        Self { event_name: Self::EVENT }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PawnPosition {
    pub name: String,
    #[serde(rename = "currentPosition")]
    pub current_position: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PawnPositions {
    pub quadrant: String,
    #[serde(rename = "pawnPositions")]
    pub pawn_positions: Vec<PawnPosition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnMessage {
    pub turn: String,
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    pub positions: Vec<PawnPositions>,
}

impl TurnMessage {
    pub const EVENT: &'static str = "Turn";
}

#[derive(Debug, Clone, Serialize)]
pub struct DiceRollingMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
}

impl DiceRollingMessage {
    pub const EVENT: &'static str = "Board.DiceRolling";

    pub fn new() -> Self {
        Self { event_name: Self::EVENT }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiceRolledMessage {
    pub number: i32,
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    pub quadrant: String,
    #[serde(rename = "movablePawns")]
    pub movable_pawns: Vec<String>,
}

impl DiceRolledMessage {
    pub const EVENT: &'static str = "Board.DiceRolled";
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub message: String,
    #[serde(rename = "currentLocation")]
    pub current_location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PawnMovedMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    pub pawn: String,
    pub steps: i32,
    pub quadrant: String,
    #[serde(rename = "responseCode")]
    pub response_code: i32,
    #[serde(rename = "initialPosition")]
    pub initial_position: i32,
    #[serde(rename = "finalPosition")]
    pub final_position: i32,
    #[serde(rename = "initialIndex")]
    pub initial_index: i32,
    #[serde(rename = "finalIndex")]
    pub final_index: i32,
    #[serde(rename = "isAtHome")]
    pub is_at_home: bool,
    #[serde(rename = "capturedPawns")]
    pub captured_pawns: Vec<String>,
    #[serde(rename = "validationErrors")]
    pub validation_errors: Vec<ValidationError>,
    pub positions: Vec<PawnPositions>,
}

impl PawnMovedMessage {
    pub const EVENT: &'static str = "Board.PawnMoved";
}

#[derive(Debug, Clone, Serialize)]
pub struct GameEndMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    pub winner: String,
    #[serde(rename = "winningAmount")]
    pub winning_amount: i64,
    #[serde(rename = "responseCode")]
    pub response_code: i32,
}

impl GameEndMessage {
    pub const EVENT: &'static str = "Game.End";
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerDisconnectedMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    pub player: String,
}

impl PlayerDisconnectedMessage {
    pub const EVENT: &'static str = "Player.Disconnected";
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardReconnectionMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    pub participants: Vec<ParticipantInfo>,
    pub positions: Vec<PawnPositions>,
}

impl BoardReconnectionMessage {
    pub const EVENT: &'static str = "Player.Reconnected";
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardBetFailedMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    pub message: String,
}

impl BoardBetFailedMessage {
    pub const EVENT: &'static str = "Board.BetFailed";
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "eventName")]
    pub event_name: &'static str,
    #[serde(rename = "errorCode")]
    pub error_code: i32,
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

impl ErrorMessage {
    pub const EVENT: &'static str = "error";

    pub fn new(error_code: i32, error_message: impl Into<String>) -> Self {
        Self {
            event_name: Self::EVENT,
            error_code,
            error_message: error_message.into(),
        }
    }
}

// --------------------------------------------------------------- REST

#[derive(Debug, Clone, Serialize)]
pub struct BoardListPlayer {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardListEntry {
    #[serde(rename = "boardId")]
    pub board_id: String,
    pub players: Vec<BoardListPlayer>,
    #[serde(rename = "playersRequiredToStartGame")]
    pub players_required_to_start_game: u8,
    pub status: String,
    #[serde(rename = "autoPlay")]
    pub auto_play: bool,
    #[serde(rename = "ticketAmount")]
    pub ticket_amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardListResponse {
    pub code: String,
    pub message: String,
    pub boards: Vec<BoardListEntry>,
}
