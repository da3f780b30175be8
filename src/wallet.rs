//! Bet / win / refund settlement against the external wallet service.
//!
//! Grounded on `ludo/board/board.go`'s `makeBetRequest`/`CreateWinTransaction`
//! /`RefundPlayer` helpers: three JSON POSTs to a configured base URL, with
//! `"RS200"` as the only success code and `"RS405"` mapped to a specific
//! insufficient-balance message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GameError, GameResult};

const RS200: &str = "RS200";
const RS405: &str = "RS405";

#[derive(Debug, Serialize)]
struct BetPayload<'a> {
    #[serde(rename = "walletAddress")]
    wallet_address: &'a str,
    amount: i64,
}

#[derive(Debug, Serialize)]
struct RefundPayload<'a> {
    #[serde(rename = "playerId")]
    player_id: &'a str,
    amount: i64,
    #[serde(rename = "transactionUuid")]
    transaction_uuid: String,
    #[serde(rename = "requestUuid")]
    request_uuid: String,
    currency: &'static str,
    #[serde(rename = "gameId")]
    game_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct WalletResponse {
    #[serde(default)]
    code: String,
}

/// Abstracts the wallet RPCs so board logic can be tested without a live
/// platform API; `HttpWalletClient` is the real implementation.
#[async_trait]
pub trait WalletClient: Send + Sync {
    async fn bet(&self, wallet_address: &str, amount: i64) -> GameResult<()>;
    async fn win(&self, wallet_address: &str, amount: i64) -> GameResult<()>;
    async fn refund(&self, player_id: &str, board_id: &str, amount: i64) -> GameResult<()>;
}

pub struct HttpWalletClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpWalletClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    async fn post_wallet_op<T: Serialize + Sync>(&self, endpoint: &str, payload: &T) -> GameResult<()> {
        let url = format!("{}{endpoint}", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| GameError::Wallet(e.to_string()))?;

        let body: WalletResponse = resp
            .json()
            .await
            .map_err(|e| GameError::Wallet(e.to_string()))?;

        if body.code != RS200 {
            if body.code == RS405 {
                return Err(GameError::BetFailed("Insufficient balance".to_string()));
            }
            return Err(GameError::Wallet(format!("wallet call failed: {}", body.code)));
        }
        Ok(())
    }
}

#[async_trait]
impl WalletClient for HttpWalletClient {
    async fn bet(&self, wallet_address: &str, amount: i64) -> GameResult<()> {
        if amount == 0 {
            return Ok(());
        }
        self.post_wallet_op(
            "/core/crypto/game/ludoBet",
            &BetPayload { wallet_address, amount },
        )
        .await
    }

    async fn win(&self, wallet_address: &str, amount: i64) -> GameResult<()> {
        if amount == 0 {
            return Ok(());
        }
        self.post_wallet_op(
            "/core/crypto/game/ludoWin",
            &BetPayload { wallet_address, amount },
        )
        .await
    }

    async fn refund(&self, player_id: &str, board_id: &str, amount: i64) -> GameResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let payload = RefundPayload {
            player_id,
            amount,
            transaction_uuid: Uuid::new_v4().to_string(),
            request_uuid: Uuid::new_v4().to_string(),
            currency: "INR",
            game_id: board_id,
        };

        self.post_wallet_op("/wallet/refund", &payload).await
    }
}

/// In-memory stub used by unit and scenario tests.
#[derive(Default)]
pub struct StubWallet {
    pub fail_bet: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl WalletClient for StubWallet {
    async fn bet(&self, _wallet_address: &str, _amount: i64) -> GameResult<()> {
        if self.fail_bet.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(GameError::BetFailed("Insufficient balance".to_string()));
        }
        Ok(())
    }

    async fn win(&self, _wallet_address: &str, _amount: i64) -> GameResult<()> {
        Ok(())
    }

    async fn refund(&self, _player_id: &str, _board_id: &str, _amount: i64) -> GameResult<()> {
        Ok(())
    }
}
