//! Board pool manager: keeps a standing supply of empty `WAITING` boards
//! per `(maxPlayers, ticketAmount)` bucket and reaps terminal ones.
//!
//! Grounded on `ludo/ludo_game_service.go`'s `CreateEmptyBoardInstances` /
//! `cleanupAndCreateBoards` / `StartBoardManagement` — the fuller, bucket-
//! per-ticket-amount version of that logic (the narrower
//! `createEmptyBoardInstances(playerCount)` path it actually wires up at
//! startup only ever provisions the `100` bucket; we implement the general
//! form all three configured amounts call for).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::board::Board;
use crate::board_layout;
use crate::error::GameResult;
use crate::messages::{BoardListEntry, BoardListPlayer, BoardListResponse};
use crate::model::{BoardStatus, RakeKind};
use crate::persistence::BoardStore;
use crate::rng::Dice;
use crate::wallet::WalletClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BucketKey {
    max_players: u8,
    ticket_amount: i64,
}

pub struct BoardPool {
    boards: RwLock<HashMap<String, Arc<RwLock<Board>>>>,
    wallet: Arc<dyn WalletClient>,
    store: Arc<dyn BoardStore>,
    dice_factory: Arc<dyn Fn() -> Arc<dyn Dice> + Send + Sync>,
}

impl BoardPool {
    pub fn new(
        wallet: Arc<dyn WalletClient>,
        store: Arc<dyn BoardStore>,
        dice_factory: Arc<dyn Fn() -> Arc<dyn Dice> + Send + Sync>,
    ) -> Self {
        Self {
            boards: RwLock::new(HashMap::new()),
            wallet,
            store,
            dice_factory,
        }
    }

    pub async fn get(&self, board_id: &str) -> Option<Arc<RwLock<Board>>> {
        self.boards.read().await.get(board_id).cloned()
    }

    /// One tick of the pool manager: reap terminal boards, then top each
    /// bucket back up to `BOARDS_PER_BUCKET`. Runs once at startup and
    /// every 30s thereafter.
    pub async fn tick(&self) -> GameResult<()> {
        self.reap_terminal_boards().await;

        let mut counts: HashMap<BucketKey, usize> = HashMap::new();
        {
            let boards = self.boards.read().await;
            for board in boards.values() {
                let board = board.read().await;
                if board.status() == BoardStatus::Waiting && board.players().is_empty() {
                    *counts
                        .entry(BucketKey {
                            max_players: board.max_players(),
                            ticket_amount: board.ticket_amount(),
                        })
                        .or_insert(0) += 1;
                }
            }
        }

        for &max_players in &board_layout::PLAYERS_REQUIRED_TO_START_GAME {
            for &ticket_amount in &board_layout::TICKET_AMOUNTS {
                let key = BucketKey { max_players, ticket_amount };
                let existing = counts.get(&key).copied().unwrap_or(0);
                for i in existing..board_layout::BOARDS_PER_BUCKET {
                    let rake_kind = if i < 3 { RakeKind::Fixed } else { RakeKind::Percentage };
                    self.spawn_board(max_players, ticket_amount, rake_kind).await?;
                }
            }
        }

        Ok(())
    }

    async fn reap_terminal_boards(&self) {
        let mut boards = self.boards.write().await;
        let mut terminal = Vec::new();
        for (id, board) in boards.iter() {
            let status = board.read().await.status();
            if matches!(status, BoardStatus::Finished | BoardStatus::Discarded) {
                terminal.push(id.clone());
            }
        }
        for id in terminal {
            boards.remove(&id);
        }
    }

    async fn spawn_board(&self, max_players: u8, ticket_amount: i64, rake_kind: RakeKind) -> GameResult<()> {
        let board_id = Uuid::new_v4().to_string();
        let rake_amount = board_layout::rake_amount(rake_kind);

        let board = Board::new(
            board_id.clone(),
            max_players,
            board_layout::AUTO_PLAY,
            ticket_amount,
            rake_amount,
            rake_kind,
            board_layout::AUTO_PLAY_TIMER_SECS,
            Arc::clone(&self.wallet),
            Arc::clone(&self.store),
            (self.dice_factory)(),
        );
        board.persist_new().await?;

        self.boards.write().await.insert(board_id, Arc::new(RwLock::new(board)));
        Ok(())
    }

    /// Assigns an existing `WAITING` board with room for a player in the
    /// requested bucket; used by the connection manager when a lobby
    /// request names a bucket rather than a specific board id.
    pub async fn find_open_board(&self, max_players: u8, ticket_amount: i64) -> Option<String> {
        let boards = self.boards.read().await;
        for (id, board) in boards.iter() {
            let board = board.read().await;
            if board.status() == BoardStatus::Waiting
                && board.max_players() == max_players
                && board.ticket_amount() == ticket_amount
                && (board.players().len() as u8) < max_players
            {
                return Some(id.clone());
            }
        }
        None
    }

    pub async fn board_list(&self) -> BoardListResponse {
        let boards = self.boards.read().await;
        let mut entries = Vec::new();
        for board in boards.values() {
            let board = board.read().await;
            if !matches!(board.status(), BoardStatus::Waiting | BoardStatus::Playing) {
                continue;
            }
            entries.push(BoardListEntry {
                board_id: board.id().to_string(),
                players: board
                    .players()
                    .iter()
                    .map(|p| BoardListPlayer {
                        player_id: p.player_id.clone(),
                        name: p.name.clone(),
                    })
                    .collect(),
                players_required_to_start_game: board.max_players(),
                status: board.status().to_string(),
                auto_play: board_layout::AUTO_PLAY,
                ticket_amount: board.ticket_amount(),
            });
        }
        BoardListResponse {
            code: "B200".to_string(),
            message: "BOARD_LIST_FETCHED_SUCCESSFULLY".to_string(),
            boards: entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::NullBoardStore;
    use crate::rng::BiasedDice;
    use crate::wallet::StubWallet;

    fn new_test_pool() -> BoardPool {
        BoardPool::new(
            Arc::new(StubWallet::default()),
            Arc::new(NullBoardStore),
            Arc::new(|| Arc::new(BiasedDice::new()) as Arc<dyn Dice>),
        )
    }

    #[tokio::test]
    async fn tick_provisions_six_boards_per_bucket() {
        let pool = new_test_pool();
        pool.tick().await.unwrap();

        let boards = pool.boards.read().await;
        let mut counts: HashMap<BucketKey, usize> = HashMap::new();
        for board in boards.values() {
            let board = board.read().await;
            *counts
                .entry(BucketKey {
                    max_players: board.max_players(),
                    ticket_amount: board.ticket_amount(),
                })
                .or_insert(0) += 1;
        }
        assert_eq!(counts.len(), board_layout::PLAYERS_REQUIRED_TO_START_GAME.len() * board_layout::TICKET_AMOUNTS.len());
        for count in counts.values() {
            assert_eq!(*count, board_layout::BOARDS_PER_BUCKET);
        }
    }

    #[tokio::test]
    async fn tick_is_idempotent_once_buckets_are_full() {
        let pool = new_test_pool();
        pool.tick().await.unwrap();
        pool.tick().await.unwrap();
        assert_eq!(
            pool.boards.read().await.len(),
            board_layout::PLAYERS_REQUIRED_TO_START_GAME.len()
                * board_layout::TICKET_AMOUNTS.len()
                * board_layout::BOARDS_PER_BUCKET
        );
    }
}
