//! The per-board state machine: quadrant/player bookkeeping, turn order,
//! dice rolls, pawn movement and capture, settlement, and the expectation
//! gate that decides which inbound event a board will currently accept.
//!
//! Grounded on `ludo/board/board.go`. Board owns no socket — every handler
//! below returns the [`Outbound`] messages a caller (the connection
//! manager) is responsible for delivering, either broadcast to every
//! socket on the board or addressed to one player. This keeps the state
//! machine synchronously testable without a live network or Mongo.

use std::sync::Arc;

use chrono::Utc;

use crate::board_layout;
use crate::error::{GameError, GameResult};
use crate::expectation::{ExpectedMessage, InboundEvent};
use crate::messages::*;
use crate::model::{BoardStatus, MoveResult, Player, Quadrant, SelectionStatus};
use crate::persistence::{BoardDoc, BoardStore, ConnectionEvent, PlayerDoc};
use crate::rng::Dice;
use crate::wallet::WalletClient;

/// A message a caller must deliver after a handler runs.
pub enum Outbound {
    Broadcast(serde_json::Value),
    Direct(String, serde_json::Value),
}

fn broadcast<T: serde::Serialize>(out: &mut Vec<Outbound>, msg: &T) {
    out.push(Outbound::Broadcast(
        serde_json::to_value(msg).expect("outbound message serializes"),
    ));
}

fn direct<T: serde::Serialize>(out: &mut Vec<Outbound>, player_id: &str, msg: &T) {
    out.push(Outbound::Direct(
        player_id.to_string(),
        serde_json::to_value(msg).expect("outbound message serializes"),
    ));
}

/// What a caller should do after `handle_disconnection` returns.
pub enum DisconnectOutcome {
    /// Nothing further needed; the board already dealt with it internally.
    Settled,
    /// Exactly one connected player remains; the caller should wait
    /// `GRACE_PERIOD_SECS` and then call `recheck_after_grace_period`.
    StartGracePeriod { remaining_player_id: String },
}

pub struct Board {
    id: String,
    quadrants: Vec<Quadrant>,
    players: Vec<Player>,
    status: BoardStatus,
    current_turn: Option<String>,
    next_turn: Option<String>,
    dice_rolled_value: Option<i32>,
    expectation: Option<ExpectedMessage>,
    auto_play: bool,
    auto_play_timer: u64,
    ticket_amount: i64,
    rake_amount: i64,
    rake_amount_type: crate::model::RakeKind,
    players_required_to_start_game: u8,

    wallet: Arc<dyn WalletClient>,
    store: Arc<dyn BoardStore>,
    dice: Arc<dyn Dice>,
}

impl Board {
    pub fn new(
        id: String,
        players_required_to_start_game: u8,
        auto_play: bool,
        ticket_amount: i64,
        rake_amount: i64,
        rake_amount_type: crate::model::RakeKind,
        auto_play_timer: u64,
        wallet: Arc<dyn WalletClient>,
        store: Arc<dyn BoardStore>,
        dice: Arc<dyn Dice>,
    ) -> Self {
        let quadrants = board_layout::QUADRANT_NAMES
            .iter()
            .map(|name| Quadrant::new(*name))
            .collect();

        Self {
            id,
            quadrants,
            players: Vec::new(),
            status: BoardStatus::Waiting,
            current_turn: None,
            next_turn: None,
            dice_rolled_value: None,
            expectation: None,
            auto_play,
            auto_play_timer,
            ticket_amount,
            rake_amount,
            rake_amount_type,
            players_required_to_start_game,
            wallet,
            store,
            dice,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> BoardStatus {
        self.status
    }

    pub fn max_players(&self) -> u8 {
        self.players_required_to_start_game
    }

    pub fn ticket_amount(&self) -> i64 {
        self.ticket_amount
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn has_finished(&self) -> bool {
        self.status == BoardStatus::Finished
    }

    /// Writes the initial board document. Call once, right after `new`.
    pub async fn persist_new(&self) -> GameResult<()> {
        self.store
            .insert_board(BoardDoc {
                id: self.id.clone(),
                board_id: self.id.clone(),
                ticket_amount: self.ticket_amount,
                rake_amount: self.rake_amount,
                rake_amount_type: self.rake_amount_type,
                winning_amount: 0,
                status: self.status.to_string(),
                auto_play: self.auto_play,
                auto_play_timer: self.auto_play_timer,
                players_required_to_start_game: self.players_required_to_start_game,
                start_time: None,
                end_time: None,
                winner: None,
                players: Vec::new(),
                pawn_moves: bson::Document::new(),
            })
            .await
    }

    // ------------------------------------------------------------ lookups

    fn quadrant_by_name(&self, name: &str) -> Option<&Quadrant> {
        self.quadrants.iter().find(|q| q.name() == name)
    }

    fn quadrant_by_name_mut(&mut self, name: &str) -> Option<&mut Quadrant> {
        self.quadrants.iter_mut().find(|q| q.name() == name)
    }

    fn quadrant_by_player(&self, player_id: &str) -> Option<&Quadrant> {
        self.quadrants.iter().find(|q| q.player_id() == Some(player_id))
    }

    fn player_by_id(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    fn player_by_id_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    fn player_by_quadrant(&self, quadrant_name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.quadrant.as_deref() == Some(quadrant_name))
    }

    pub fn available_quadrants(&self) -> Vec<String> {
        self.quadrants
            .iter()
            .filter(|q| !q.is_occupied())
            .map(|q| q.name().to_string())
            .collect()
    }

    fn is_board_ready_to_start(&self) -> bool {
        self.players.len() >= self.players_required_to_start_game as usize
            && self
                .players
                .iter()
                .all(|p| p.selection_status == SelectionStatus::Selected)
    }

    fn pawn_positions(&self) -> Vec<PawnPositions> {
        self.quadrants
            .iter()
            .map(|q| PawnPositions {
                quadrant: q.name().to_string(),
                pawn_positions: q
                    .pawns()
                    .iter()
                    .map(|p| PawnPosition {
                        name: p.name().to_string(),
                        current_position: p.position().unwrap_or(-1),
                    })
                    .collect(),
            })
            .collect()
    }

    fn calculate_movable_pawns(&self, quadrant_name: &str, steps: i32) -> Vec<String> {
        match self.quadrant_by_name(quadrant_name) {
            Some(q) => q
                .pawns()
                .iter()
                .filter(|p| p.is_valid_move(steps))
                .map(|p| p.name().to_string())
                .collect(),
            None => Vec::new(),
        }
    }

    // --------------------------------------------------------- join/leave

    pub async fn add_player(
        &mut self,
        player_id: &str,
        name: &str,
        wallet_address: &str,
    ) -> GameResult<Vec<Outbound>> {
        if self.has_finished() {
            return Err(GameError::InvalidMove("game has already finished".into()));
        }

        if self.player_by_id(player_id).is_some() {
            return self.handle_reconnection(player_id).await;
        }

        if self.status == BoardStatus::Playing {
            return Err(GameError::InvalidMove("game already started".into()));
        }

        if self.players.len() == self.players_required_to_start_game as usize {
            return Err(GameError::BoardFull);
        }

        self.players.push(Player::new(
            player_id.to_string(),
            name.to_string(),
            wallet_address.to_string(),
        ));

        let mut out = Vec::new();
        direct(&mut out, player_id, &self.game_initialize_message());
        broadcast(&mut out, &self.waiting_players_message(player_id, name));

        if self.players.len() == self.players_required_to_start_game as usize {
            out.extend(self.send_quadrant_selection_message());
        }

        Ok(out)
    }

    fn game_initialize_message(&self) -> GameInitializeMessage {
        let quadrants = self
            .quadrants
            .iter()
            .map(|q| QuadrantLayout {
                name: q.name().to_string(),
                color: q.color().to_string(),
                pawns: q.pawn_names(),
                path: q.path().to_vec(),
            })
            .collect();

        GameInitializeMessage {
            event_name: GameInitializeMessage::EVENT,
            safe_positions: board_layout::SAFE_POSITIONS.to_vec(),
            quadrants,
            auto_play: self.auto_play,
            auto_play_timer: self.auto_play_timer,
            players_required_to_start_game: self.players_required_to_start_game,
            ticket_amount: self.ticket_amount,
            player_selecting_the_quadrant: self.player_prompted_for_selection(),
        }
    }

    fn player_prompted_for_selection(&self) -> Option<String> {
        self.players
            .iter()
            .find(|p| p.selection_status == SelectionStatus::Prompted)
            .map(|p| p.player_id.clone())
    }

    fn waiting_players_message(&self, new_player_id: &str, new_player_name: &str) -> BoardWaitingPlayersMessage {
        BoardWaitingPlayersMessage {
            event_name: BoardWaitingPlayersMessage::EVENT,
            waiting_players: self
                .players
                .iter()
                .map(|p| WaitingPlayerInfo {
                    player_id: p.player_id.clone(),
                    name: p.name.clone(),
                })
                .collect(),
            new_player: WaitingPlayerInfo {
                player_id: new_player_id.to_string(),
                name: new_player_name.to_string(),
            },
            player_selecting_quadrant: self.player_prompted_for_selection(),
        }
    }

    async fn handle_reconnection(&mut self, player_id: &str) -> GameResult<Vec<Outbound>> {
        let now = Utc::now();
        if let Some(p) = self.player_by_id_mut(player_id) {
            p.connected = true;
            p.reconnected_at = Some(now);
        }

        if let Err(err) = self
            .store
            .update_connection_details(&self.id, player_id, ConnectionEvent::Reconnection, now)
            .await
        {
            tracing::warn!(%err, player_id, "failed to persist reconnection timestamp");
        }

        let mut out = Vec::new();
        direct(&mut out, player_id, &self.reconnection_message());
        out.extend(self.handle_message_after_reconnection(player_id));
        Ok(out)
    }

    fn reconnection_message(&self) -> BoardReconnectionMessage {
        BoardReconnectionMessage {
            event_name: BoardReconnectionMessage::EVENT,
            participants: self.selected_participants(),
            positions: self.pawn_positions(),
        }
    }

    fn selected_participants(&self) -> Vec<ParticipantInfo> {
        self.players
            .iter()
            .filter(|p| p.selection_status == SelectionStatus::Selected)
            .map(|p| ParticipantInfo {
                player: WaitingPlayerInfo {
                    player_id: p.player_id.clone(),
                    name: p.name.clone(),
                },
                quadrant: p.quadrant.clone().unwrap_or_default(),
            })
            .collect()
    }

    /// Re-sends whatever the reconnecting player's socket missed, based on
    /// the single in-flight expectation — mirrors the three branches of
    /// the original's post-reconnection replay.
    fn handle_message_after_reconnection(&mut self, player_id: &str) -> Vec<Outbound> {
        let mut out = Vec::new();
        let Some(exp) = self.expectation.clone() else {
            return out;
        };
        if exp.player_id != player_id {
            return out;
        }

        match exp.event {
            InboundEvent::MovePawn => {
                if let Some(q) = self.quadrant_by_player(player_id) {
                    if self.current_turn.as_deref() == Some(q.name()) {
                        let quadrant_name = q.name().to_string();
                        let dice_value = self.dice_rolled_value.unwrap_or(0);
                        let movable = self.calculate_movable_pawns(&quadrant_name, dice_value);
                        broadcast(
                            &mut out,
                            &DiceRolledMessage {
                                number: dice_value,
                                event_name: DiceRolledMessage::EVENT,
                                quadrant: quadrant_name.clone(),
                                movable_pawns: movable,
                            },
                        );
                        self.expectation = Some(
                            ExpectedMessage::new(InboundEvent::MovePawn, player_id, Some(quadrant_name))
                                .with_steps(dice_value),
                        );
                    }
                }
            }
            InboundEvent::DiceRoll | InboundEvent::TurnCompleted => {
                if let Some(turn) = self.current_turn.clone() {
                    broadcast(
                        &mut out,
                        &TurnMessage {
                            turn: turn.clone(),
                            event_name: TurnMessage::EVENT,
                            positions: self.pawn_positions(),
                        },
                    );
                    self.install_dice_roll_expectation(&turn);
                }
            }
            InboundEvent::SelectQuadrant => {
                out.extend(self.send_quadrant_selection_message());
            }
        }
        out
    }

    pub async fn handle_disconnection(&mut self, player_id: &str) -> GameResult<(Vec<Outbound>, DisconnectOutcome)> {
        let mut out = Vec::new();

        let Some(quadrant_name) = self.quadrant_by_player(player_id).map(|q| q.name().to_string()) else {
            self.remove_player(player_id);
            return Err(GameError::PlayerNotFound(player_id.to_string()));
        };
        let _ = quadrant_name;

        let disconnected_name = match self.player_by_id(player_id) {
            Some(p) => p.name.clone(),
            None => return Err(GameError::PlayerNotFound(player_id.to_string())),
        };

        let now = Utc::now();
        if let Some(p) = self.player_by_id_mut(player_id) {
            p.connected = false;
            p.disconnected_at = Some(now);
        }
        if let Err(err) = self
            .store
            .update_connection_details(&self.id, player_id, ConnectionEvent::Disconnection, now)
            .await
        {
            tracing::warn!(%err, player_id, "failed to persist disconnection timestamp");
        }

        broadcast(
            &mut out,
            &PlayerDisconnectedMessage {
                event_name: PlayerDisconnectedMessage::EVENT,
                player: disconnected_name,
            },
        );

        if self.has_finished() {
            return Ok((out, DisconnectOutcome::Settled));
        }

        let has_selected = self.player_by_id(player_id).map(|p| p.has_selected_quadrant()).unwrap_or(false);
        if !has_selected || self.status == BoardStatus::Waiting {
            self.remove_player(player_id);
            return Ok((out, DisconnectOutcome::Settled));
        }

        let connected: Vec<&Player> = self.players.iter().filter(|p| p.is_connected()).collect();
        if connected.is_empty() {
            out.extend(self.handle_all_disconnection().await?);
            return Ok((out, DisconnectOutcome::Settled));
        }

        if connected.len() == 1 {
            let remaining_player_id = connected[0].player_id.clone();
            return Ok((out, DisconnectOutcome::StartGracePeriod { remaining_player_id }));
        }

        Ok((out, DisconnectOutcome::Settled))
    }

    /// Called by the caller once the grace period has elapsed; re-checks
    /// that only one player is still connected before declaring them the
    /// winner, in case the rest reconnected in the meantime.
    pub async fn recheck_after_grace_period(&mut self, remaining_player_id: &str) -> GameResult<Vec<Outbound>> {
        let connected_count = self.players.iter().filter(|p| p.is_connected()).count();
        if connected_count == 1 {
            self.handle_all_disconnected_except_one(remaining_player_id).await
        } else {
            Ok(Vec::new())
        }
    }

    fn remove_player(&mut self, player_id: &str) {
        if let Some(quadrant_name) = self.quadrant_by_player(player_id).map(|q| q.name().to_string()) {
            if let Some(q) = self.quadrant_by_name_mut(&quadrant_name) {
                q.remove_player();
            }
        }
        self.players.retain(|p| p.player_id != player_id);
    }

    async fn handle_all_disconnection(&mut self) -> GameResult<Vec<Outbound>> {
        let player_ids: Vec<String> = self.players.iter().map(|p| p.player_id.clone()).collect();
        for player_id in &player_ids {
            if let Err(err) = self.wallet.refund(player_id, &self.id, self.ticket_amount).await {
                tracing::warn!(%err, player_id, board_id = %self.id, "refund failed while discarding board");
            }
            self.remove_player(player_id);
        }

        self.status = BoardStatus::Discarded;
        if let Err(err) = self
            .store
            .update_status_and_end_time(&self.id, &self.status.to_string(), Utc::now())
            .await
        {
            tracing::warn!(%err, board_id = %self.id, "failed to persist board discard");
        }
        Ok(Vec::new())
    }

    async fn handle_all_disconnected_except_one(&mut self, remaining_player_id: &str) -> GameResult<Vec<Outbound>> {
        let mut out = Vec::new();
        let winning_amount = self.winning_amount();

        if let Err(err) = self
            .store
            .update_status_and_end_time(&self.id, &BoardStatus::Finished.to_string(), Utc::now())
            .await
        {
            tracing::warn!(%err, board_id = %self.id, "failed to persist board end time");
        }
        if let Err(err) = self.store.update_winner(&self.id, remaining_player_id, winning_amount).await {
            tracing::warn!(%err, board_id = %self.id, "failed to persist board winner");
        }

        self.status = BoardStatus::Finished;

        if let Some(wallet_address) = self.player_by_id(remaining_player_id).map(|p| p.wallet_address.clone()) {
            if let Err(err) = self.wallet.win(&wallet_address, winning_amount).await {
                tracing::warn!(%err, player_id = remaining_player_id, "win settlement failed");
            }
        }

        broadcast(
            &mut out,
            &GameEndMessage {
                event_name: GameEndMessage::EVENT,
                winner: remaining_player_id.to_string(),
                winning_amount,
                response_code: 200,
            },
        );

        let player_ids: Vec<String> = self.players.iter().map(|p| p.player_id.clone()).collect();
        for player_id in player_ids {
            self.remove_player(&player_id);
        }

        Ok(out)
    }

    fn winning_amount(&self) -> i64 {
        let pool = self.ticket_amount * self.players_required_to_start_game as i64;
        match self.rake_amount_type {
            crate::model::RakeKind::Percentage if self.rake_amount > 0 => pool - (pool * self.rake_amount / 100),
            _ => pool - self.rake_amount,
        }
    }

    // ------------------------------------------------------ quadrant select

    pub async fn select_quadrant(&mut self, player_id: &str, quadrant_name: &str) -> GameResult<Vec<Outbound>> {
        if !self.available_quadrants().iter().any(|q| q == quadrant_name) {
            return Err(GameError::InvalidMove("quadrant not available".into()));
        }

        let wallet_address = self
            .player_by_id(player_id)
            .map(|p| p.wallet_address.clone())
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;

        let mut out = Vec::new();

        if let Err(err) = self.wallet.bet(&wallet_address, self.ticket_amount).await {
            direct(
                &mut out,
                player_id,
                &BoardBetFailedMessage {
                    event_name: BoardBetFailedMessage::EVENT,
                    message: err.to_string(),
                },
            );
            self.remove_player(player_id);
            return Ok(out);
        }

        if let Some(q) = self.quadrant_by_name_mut(quadrant_name) {
            let _ = q.select(player_id);
        }
        let player_name = {
            let p = self.player_by_id_mut(player_id).expect("player exists: checked above");
            p.assign_quadrant(quadrant_name);
            p.selection_status = SelectionStatus::Selected;
            p.name.clone()
        };

        if let Err(err) = self
            .store
            .add_player(
                &self.id,
                PlayerDoc {
                    id: player_id.to_string(),
                    player_id: player_id.to_string(),
                    name: player_name,
                    quadrant: quadrant_name.to_string(),
                    joined_at: Utc::now(),
                    disconnected_at: None,
                    reconnected_at: None,
                },
            )
            .await
        {
            tracing::warn!(%err, player_id, "failed to persist quadrant selection");
        }

        broadcast(&mut out, &self.build_board_joined_message());

        out.extend(self.start_game_if_ready().await?);

        if !self.available_quadrants().is_empty() {
            out.extend(self.send_quadrant_selection_message());
        }

        Ok(out)
    }

    fn build_board_joined_message(&self) -> BoardJoinedMessage {
        BoardJoinedMessage {
            event_name: BoardJoinedMessage::EVENT,
            participants: self.selected_participants(),
            player_selecting_the_quadrant: self.player_prompted_for_selection(),
        }
    }

    fn send_quadrant_selection_message(&mut self) -> Vec<Outbound> {
        let mut out = Vec::new();

        if self.players.iter().any(|p| p.selection_status == SelectionStatus::Prompted) {
            return out;
        }

        let Some(player_id) = self
            .players
            .iter()
            .find(|p| p.selection_status == SelectionStatus::None)
            .map(|p| p.player_id.clone())
        else {
            return out;
        };

        if let Some(p) = self.player_by_id_mut(&player_id) {
            p.selection_status = SelectionStatus::Prompted;
        }

        let available = self.available_quadrants();
        direct(
            &mut out,
            &player_id,
            &SelectQuadrantMessage {
                event_name: SelectQuadrantMessage::EVENT,
                quadrants: available,
                response_code: 200,
            },
        );
        self.expectation = Some(ExpectedMessage::new(InboundEvent::SelectQuadrant, &player_id, None));

        let player_name = self.player_by_id(&player_id).map(|p| p.name.clone()).unwrap_or_default();
        broadcast(
            &mut out,
            &BoardSelectingQuadrantMessage {
                event_name: BoardSelectingQuadrantMessage::EVENT,
                player: player_name,
            },
        );

        out
    }

    async fn start_game_if_ready(&mut self) -> GameResult<Vec<Outbound>> {
        if !self.is_board_ready_to_start() {
            return Ok(Vec::new());
        }

        if let Err(err) = self
            .store
            .update_status_and_start_time(&self.id, &BoardStatus::Playing.to_string(), Utc::now())
            .await
        {
            tracing::warn!(%err, board_id = %self.id, "failed to persist game start");
        }

        self.set_first_turn();
        self.status = BoardStatus::Playing;

        let mut out = Vec::new();
        broadcast(&mut out, &GameStartMessage::new());

        let turn = self.current_turn.clone().unwrap_or_default();
        broadcast(
            &mut out,
            &TurnMessage {
                turn: turn.clone(),
                event_name: TurnMessage::EVENT,
                positions: self.pawn_positions(),
            },
        );
        self.install_dice_roll_expectation(&turn);

        Ok(out)
    }

    fn set_first_turn(&mut self) {
        let Some(idx) = self.quadrants.iter().position(|q| q.player_id().is_some()) else {
            return;
        };
        self.current_turn = Some(self.quadrants[idx].name().to_string());
        for offset in 1..self.quadrants.len() {
            let next = (idx + offset) % self.quadrants.len();
            if self.quadrants[next].player_id().is_some() {
                self.next_turn = Some(self.quadrants[next].name().to_string());
                break;
            }
        }
    }

    fn install_dice_roll_expectation(&mut self, quadrant_name: &str) {
        let player_id = self.player_by_quadrant(quadrant_name).map(|p| p.player_id.clone());
        if let Some(player_id) = player_id {
            self.expectation = Some(ExpectedMessage::new(
                InboundEvent::DiceRoll,
                player_id,
                Some(quadrant_name.to_string()),
            ));
        }
    }

    // ------------------------------------------------------------- dice roll

    pub async fn dice_roll(&mut self, player_id: &str) -> GameResult<Vec<Outbound>> {
        let mut out = Vec::new();
        broadcast(&mut out, &DiceRollingMessage::new());

        let Some(quadrant_name) = self.quadrant_by_player(player_id).map(|q| q.name().to_string()) else {
            return Ok(out);
        };

        let has_unlocked_pawns = self
            .quadrant_by_name(&quadrant_name)
            .map(|q| q.pawns().iter().any(|p| !p.is_idle()))
            .unwrap_or(false);

        tokio::time::sleep(std::time::Duration::from_millis(board_layout::DICE_PACING_MS)).await;
        let dice_value = self.dice.roll() as i32;
        self.dice_rolled_value = Some(dice_value);

        let movable_pawns = self.calculate_movable_pawns(&quadrant_name, dice_value);
        broadcast(
            &mut out,
            &DiceRolledMessage {
                number: dice_value,
                event_name: DiceRolledMessage::EVENT,
                quadrant: quadrant_name.clone(),
                movable_pawns,
            },
        );
        self.expectation = Some(
            ExpectedMessage::new(InboundEvent::MovePawn, player_id, Some(quadrant_name.clone()))
                .with_steps(dice_value),
        );

        if !has_unlocked_pawns && dice_value != 6 {
            out.extend(self.next_turn(dice_value, false, false, true));
            return Ok(out);
        }

        let can_move = self
            .quadrant_by_name(&quadrant_name)
            .map(|q| {
                q.pawns()
                    .iter()
                    .any(|p| (p.is_idle() && dice_value == 6) || (!p.is_idle() && p.is_valid_move(dice_value)))
            })
            .unwrap_or(false);

        if !can_move {
            out.extend(self.next_turn(dice_value, false, false, true));
        }

        Ok(out)
    }

    fn next_turn(&mut self, dice_value: i32, captured: bool, reached_last_position: bool, send_message: bool) -> Vec<Outbound> {
        let mut out = Vec::new();
        if self.quadrants.is_empty() {
            return out;
        }

        if dice_value == 6 || captured || reached_last_position {
            if send_message {
                let turn = self.current_turn.clone().unwrap_or_default();
                broadcast(
                    &mut out,
                    &TurnMessage {
                        turn: turn.clone(),
                        event_name: TurnMessage::EVENT,
                        positions: self.pawn_positions(),
                    },
                );
                self.install_dice_roll_expectation(&turn);
            }
            return out;
        }

        if let Some(current) = self.current_turn.clone() {
            if let Some(current_index) = self.quadrants.iter().position(|q| q.name() == current) {
                for offset in 1..self.quadrants.len() {
                    let next_index = (current_index + offset) % self.quadrants.len();
                    if self.quadrants[next_index].player_id().is_some() {
                        self.current_turn = Some(self.quadrants[next_index].name().to_string());
                        let after = (next_index + 1) % self.quadrants.len();
                        self.next_turn = Some(self.quadrants[after].name().to_string());
                        break;
                    }
                }
            }
        }

        if send_message {
            let turn = self.current_turn.clone().unwrap_or_default();
            broadcast(
                &mut out,
                &TurnMessage {
                    turn: turn.clone(),
                    event_name: TurnMessage::EVENT,
                    positions: self.pawn_positions(),
                },
            );
            self.install_dice_roll_expectation(&turn);
        }

        out
    }

    /// Real handler for the client's turn-completed acknowledgement — the
    /// original left this path unimplemented; here it simply re-announces
    /// whoever's turn it now is.
    pub fn turn_completed(&mut self) -> Vec<Outbound> {
        let mut out = Vec::new();
        let turn = self.current_turn.clone().unwrap_or_default();
        broadcast(
            &mut out,
            &TurnMessage {
                turn: turn.clone(),
                event_name: TurnMessage::EVENT,
                positions: self.pawn_positions(),
            },
        );
        self.install_dice_roll_expectation(&turn);
        out
    }

    // ------------------------------------------------------------ movement

    pub async fn move_pawn(
        &mut self,
        quadrant_name: &str,
        pawn_name: &str,
        steps: i32,
    ) -> GameResult<Vec<Outbound>> {
        if let Some(exp) = &self.expectation {
            if exp.steps.is_some() && exp.steps != Some(steps) {
                return Err(GameError::InvalidMove(format!(
                    "invalid steps {steps}, expected {:?} on quadrant {quadrant_name}",
                    exp.steps
                )));
            }
        }

        let owner_player_id = self
            .quadrant_by_name(quadrant_name)
            .and_then(|q| q.player_id().map(str::to_string))
            .ok_or_else(|| GameError::InvalidMove(format!("no quadrant found with name {quadrant_name}")))?;

        let move_result = {
            let quadrant = self
                .quadrant_by_name_mut(quadrant_name)
                .ok_or_else(|| GameError::InvalidMove(format!("no quadrant found with name {quadrant_name}")))?;
            let pawn = quadrant
                .pawn_mut(pawn_name)
                .ok_or_else(|| GameError::InvalidMove(format!("pawn {pawn_name} not found")))?;
            pawn.move_pawn(steps)
        };

        let captured = if move_result.validation_error.is_none() {
            self.capture_pawn_if_present(quadrant_name, move_result.final_position)
        } else {
            Vec::new()
        };

        if let Err(err) = self
            .store
            .append_pawn_move(
                &self.id,
                quadrant_name,
                pawn_name,
                move_result.initial_position,
                move_result.final_position,
                steps,
                Utc::now(),
            )
            .await
        {
            tracing::warn!(%err, quadrant_name, pawn_name, "failed to persist pawn movement");
        }

        let all_finished = self
            .quadrant_by_name(quadrant_name)
            .map(|q| q.pawns().iter().all(|p| p.is_at_finish()))
            .unwrap_or(false);

        let mut out = Vec::new();
        broadcast(&mut out, &self.pawn_moved_message(quadrant_name, pawn_name, steps, &move_result, &captured));

        if all_finished {
            if let Err(err) = self
                .store
                .update_status_and_end_time(&self.id, &BoardStatus::Finished.to_string(), Utc::now())
                .await
            {
                tracing::warn!(%err, board_id = %self.id, "failed to persist game end");
            }

            let winning_amount = self.winning_amount();
            if let Err(err) = self.store.update_winner(&self.id, &owner_player_id, winning_amount).await {
                tracing::warn!(%err, board_id = %self.id, "failed to persist winner");
            }
            self.status = BoardStatus::Finished;

            broadcast(
                &mut out,
                &GameEndMessage {
                    event_name: GameEndMessage::EVENT,
                    winner: owner_player_id.clone(),
                    winning_amount,
                    response_code: 200,
                },
            );

            if let Some(wallet_address) = self.player_by_id(&owner_player_id).map(|p| p.wallet_address.clone()) {
                if let Err(err) = self.wallet.win(&wallet_address, winning_amount).await {
                    tracing::warn!(%err, player_id = %owner_player_id, "win settlement failed");
                }
            }

            return Ok(out);
        }

        self.next_turn(steps, !captured.is_empty(), move_result.is_at_home, false);
        self.expectation = Some(ExpectedMessage::new(
            InboundEvent::TurnCompleted,
            owner_player_id,
            Some(quadrant_name.to_string()),
        ));

        Ok(out)
    }

    fn pawn_moved_message(
        &self,
        quadrant_name: &str,
        pawn_name: &str,
        steps: i32,
        move_result: &MoveResult,
        captured: &[String],
    ) -> PawnMovedMessage {
        let validation_errors = match &move_result.validation_error {
            Some(message) => vec![ValidationError {
                message: message.clone(),
                current_location: move_result.initial_position.to_string(),
            }],
            None => Vec::new(),
        };

        PawnMovedMessage {
            event_name: PawnMovedMessage::EVENT,
            pawn: pawn_name.to_string(),
            steps,
            quadrant: quadrant_name.to_string(),
            response_code: if move_result.validation_error.is_some() { 400 } else { 200 },
            initial_position: move_result.initial_position,
            final_position: move_result.final_position,
            initial_index: move_result.initial_index,
            final_index: move_result.final_index,
            is_at_home: move_result.is_at_home,
            captured_pawns: captured.to_vec(),
            validation_errors,
            positions: self.pawn_positions(),
        }
    }

    fn capture_pawn_if_present(&mut self, mover_quadrant: &str, position: i32) -> Vec<String> {
        let mut captured = Vec::new();
        if position < 0 || board_layout::is_safe_position(position) {
            return captured;
        }
        for q in self.quadrants.iter_mut().filter(|q| q.name() != mover_quadrant) {
            for p in q.pawns_mut() {
                if p.position() == Some(position) && !p.is_idle() {
                    captured.push(p.name().to_string());
                    p.send_home();
                }
            }
        }
        captured
    }

    // --------------------------------------------------------------- dispatch

    /// Validates an inbound event against the single in-flight expectation,
    /// then routes it to the matching handler. Mirrors the original's
    /// reflection-based dispatch, replaced here with a closed enum match.
    pub async fn dispatch(
        &mut self,
        event: InboundEvent,
        player_id: &str,
        payload: serde_json::Value,
    ) -> GameResult<Vec<Outbound>> {
        let player_quadrant = self.quadrant_by_player(player_id).map(|q| q.name().to_string());
        let matches = self
            .expectation
            .as_ref()
            .map(|exp| exp.matches(event, player_id, player_quadrant.as_deref()))
            .unwrap_or(false);

        if !matches {
            return Err(GameError::UnexpectedEvent {
                expected: self
                    .expectation
                    .as_ref()
                    .map(|e| e.event.wire_name().to_string())
                    .unwrap_or_else(|| "none".to_string()),
                got: event.wire_name().to_string(),
            });
        }

        match event {
            InboundEvent::SelectQuadrant => {
                let payload: SelectQuadrantPayload = serde_json::from_value(payload)
                    .map_err(|e| GameError::Protocol(e.to_string()))?;
                self.select_quadrant(player_id, &payload.quadrant).await
            }
            InboundEvent::DiceRoll => self.dice_roll(player_id).await,
            InboundEvent::MovePawn => {
                let payload: MovePawnPayload = serde_json::from_value(payload)
                    .map_err(|e| GameError::Protocol(e.to_string()))?;
                self.move_pawn(&payload.quadrant, &payload.pawn, payload.steps).await
            }
            InboundEvent::TurnCompleted => Ok(self.turn_completed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RakeKind;
    use crate::persistence::NullBoardStore;
    use crate::rng::StubDice;
    use crate::wallet::StubWallet;

    fn new_test_board(dice_values: Vec<u8>) -> Board {
        Board::new(
            "board-1".to_string(),
            2,
            true,
            0,
            0,
            RakeKind::Fixed,
            5,
            Arc::new(StubWallet::default()),
            Arc::new(NullBoardStore),
            Arc::new(StubDice::new(dice_values)),
        )
    }

    #[tokio::test]
    async fn two_players_join_and_select_quadrants_to_start_game() {
        let mut board = new_test_board(vec![6]);
        board.add_player("p1", "Alice", "0xAlice").await.unwrap();
        let out = board.add_player("p2", "Bob", "0xBob").await.unwrap();
        assert!(!out.is_empty());

        let available = board.available_quadrants();
        let q1 = available[0].clone();
        board.select_quadrant("p1", &q1).await.unwrap();

        let available = board.available_quadrants();
        let q2 = available[0].clone();
        let out = board.select_quadrant("p2", &q2).await.unwrap();

        assert_eq!(board.status(), BoardStatus::Playing);
        assert!(!out.is_empty());
        assert!(board.current_turn.is_some());
    }

    #[tokio::test]
    async fn rolling_a_six_keeps_the_turn_and_installs_move_expectation() {
        let mut board = new_test_board(vec![6]);
        board.add_player("p1", "Alice", "0xAlice").await.unwrap();
        board.add_player("p2", "Bob", "0xBob").await.unwrap();
        let q1 = board.available_quadrants()[0].clone();
        board.select_quadrant("p1", &q1).await.unwrap();
        let q2 = board.available_quadrants()[0].clone();
        board.select_quadrant("p2", &q2).await.unwrap();

        let turn_player = board.player_by_quadrant(board.current_turn.clone().unwrap().as_str()).unwrap().player_id.clone();
        board.dice_roll(&turn_player).await.unwrap();

        let exp = board.expectation.clone().unwrap();
        assert_eq!(exp.event, InboundEvent::MovePawn);
        assert_eq!(exp.steps, Some(6));
    }

    #[tokio::test]
    async fn unexpected_event_is_rejected() {
        let mut board = new_test_board(vec![6]);
        board.add_player("p1", "Alice", "0xAlice").await.unwrap();
        let result = board
            .dispatch(InboundEvent::DiceRoll, "p1", serde_json::json!({}))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn winning_amount_applies_percentage_rake() {
        let mut board = new_test_board(vec![1]);
        board.ticket_amount = 100;
        board.players_required_to_start_game = 4;
        board.rake_amount_type = RakeKind::Percentage;
        board.rake_amount = 10;
        assert_eq!(board.winning_amount(), 360);
    }

    #[test]
    fn winning_amount_applies_fixed_rake() {
        let mut board = new_test_board(vec![1]);
        board.ticket_amount = 100;
        board.players_required_to_start_game = 2;
        board.rake_amount_type = RakeKind::Fixed;
        board.rake_amount = 20;
        assert_eq!(board.winning_amount(), 180);
    }
}
