use thiserror::Error;

/// The taxonomy of things that can go wrong while a board is live.
///
/// Each variant maps to one of the client-visible or log-only outcomes
/// described by the error handling design: protocol/validation errors reach
/// the client as a direct `error` frame, wallet/persistence failures are
/// logged and otherwise swallowed so the live game keeps moving.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("unexpected event: expected {expected}, got {got}")]
    UnexpectedEvent { expected: String, got: String },

    #[error("bet failed: {0}")]
    BetFailed(String),

    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error("board is full")]
    BoardFull,

    #[error("board not found: {0}")]
    BoardNotFound(String),

    #[error("player not found: {0}")]
    PlayerNotFound(String),

    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl GameError {
    /// Whether this error should be surfaced to the client as an `error`
    /// frame, as opposed to logged and absorbed.
    pub fn is_client_visible(&self) -> bool {
        !matches!(self, GameError::Wallet(_) | GameError::Persistence(_))
    }

    /// A small stable numeric code carried in the outbound `error` frame.
    pub fn code(&self) -> i32 {
        match self {
            GameError::Unauthorized => 401,
            GameError::UnexpectedEvent { .. } => 409,
            GameError::BetFailed(_) => 402,
            GameError::InvalidMove(_) => 422,
            GameError::BoardFull => 403,
            GameError::BoardNotFound(_) => 404,
            GameError::PlayerNotFound(_) => 404,
            GameError::Wallet(_) => 502,
            GameError::Persistence(_) => 500,
            GameError::Protocol(_) => 400,
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;
