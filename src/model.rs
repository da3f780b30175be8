//! The owned-child domain hierarchy: Board → Quadrant → Pawn, Board → Player.
//!
//! Quadrant and Player are exclusively owned by Board; neither holds a
//! back-pointer to the other or to Board. Quadrant records only the bound
//! player's id, and Player records only the quadrant name it was assigned —
//! lookups go back through the Board's maps, never through a cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board_layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoardStatus {
    Waiting,
    Playing,
    Finished,
    Discarded,
}

impl fmt::Display for BoardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BoardStatus::Waiting => "WAITING",
            BoardStatus::Playing => "PLAYING",
            BoardStatus::Finished => "FINISHED",
            BoardStatus::Discarded => "DISCARDED",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PawnStatus {
    Idle,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionStatus {
    None,
    Prompted,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RakeKind {
    Fixed,
    Percentage,
}

/// The outcome of attempting to move a pawn, mirrored on `Board.PawnMoved`.
#[derive(Debug, Clone, Default)]
pub struct MoveResult {
    pub initial_position: i32,
    pub initial_index: i32,
    pub final_position: i32,
    pub final_index: i32,
    pub is_at_home: bool,
    pub validation_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Pawn {
    color: String,
    name: String,
    current_position: Option<i32>,
    status: PawnStatus,
    path: &'static [i32],
}

impl Pawn {
    pub fn new(color: &str, name: String, path: &'static [i32]) -> Self {
        Self {
            color: color.to_string(),
            name,
            current_position: None,
            status: PawnStatus::Idle,
            path,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn position(&self) -> Option<i32> {
        self.current_position
    }

    pub fn status(&self) -> PawnStatus {
        self.status
    }

    pub fn is_idle(&self) -> bool {
        self.status == PawnStatus::Idle && self.current_position.is_none()
    }

    pub fn is_at_finish(&self) -> bool {
        match self.current_position {
            Some(pos) => self.path.last().copied() == Some(pos),
            None => false,
        }
    }

    fn current_path_index(&self) -> i32 {
        match self.current_position {
            None => -1,
            Some(pos) => self
                .path
                .iter()
                .position(|&p| p == pos)
                .map(|i| i as i32)
                .unwrap_or(-1),
        }
    }

    /// Position the pawn would occupy after `steps`, or `-1` if that would
    /// run past the end of the path.
    pub fn next_position(&self, steps: i32) -> i32 {
        let current_index = self.current_path_index();

        if current_index == -1 {
            return match self.current_position {
                Some(pos) => pos,
                None => self.path.first().copied().unwrap_or(-1),
            };
        }

        let next_index = current_index + steps;
        if next_index as usize >= self.path.len() {
            return -1;
        }
        self.path[next_index as usize]
    }

    pub fn is_valid_move(&self, steps: i32) -> bool {
        if self.status == PawnStatus::Finished {
            return false;
        }
        if self.status == PawnStatus::Idle && self.current_position.is_none() && steps != 6 {
            return false;
        }
        let next_pos = self.next_position(steps);
        if next_pos == -1 {
            return false;
        }
        self.path.contains(&next_pos)
    }

    /// Mutates position and status in place; callers use `move_pawn` for the
    /// full `MoveResult` used in outbound messages.
    fn apply_move(&mut self, steps: i32) -> Option<String> {
        if !self.is_valid_move(steps) {
            let location = self.current_position.map(|p| p.to_string()).unwrap_or_else(|| "-1".into());
            return Some(format!("invalid move for pawn {} at {location}", self.name));
        }

        let next_pos = self.next_position(steps);
        self.current_position = Some(next_pos);

        if self.status == PawnStatus::Idle {
            self.status = PawnStatus::Playing;
        }
        if self.is_at_finish() {
            self.status = PawnStatus::Finished;
        }
        None
    }

    pub fn move_pawn(&mut self, steps: i32) -> MoveResult {
        let initial_position = self.current_position.unwrap_or(-1);
        let initial_index = self.current_path_index();

        if let Some(err) = self.apply_move(steps) {
            return MoveResult {
                is_at_home: self.is_idle(),
                validation_error: Some(err),
                ..Default::default()
            };
        }

        let final_position = self.current_position.unwrap_or_else(|| self.path[0]);
        let final_index = self.current_path_index().max(0);

        MoveResult {
            initial_position,
            initial_index,
            final_position,
            final_index,
            is_at_home: self.is_at_finish(),
            validation_error: None,
        }
    }

    /// Forcibly sends the pawn back to idle — used by capture.
    pub fn send_home(&mut self) {
        self.current_position = None;
        self.status = PawnStatus::Idle;
    }
}

#[derive(Debug, Clone)]
pub struct Quadrant {
    name: String,
    color: String,
    path: &'static [i32],
    pawns: Vec<Pawn>,
    player_id: Option<String>,
    is_occupied: bool,
}

impl Quadrant {
    pub fn new(name: &str) -> Self {
        let color = board_layout::quadrant_color(name);
        let path = board_layout::quadrant_path(name);
        let pawns = (1..=4)
            .map(|i| Pawn::new(color, format!("{name}_PAWN_{i}"), path))
            .collect();

        Self {
            name: name.to_string(),
            color: color.to_string(),
            path,
            pawns,
            player_id: None,
            is_occupied: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn path(&self) -> &'static [i32] {
        self.path
    }

    pub fn pawns(&self) -> &[Pawn] {
        &self.pawns
    }

    pub fn pawns_mut(&mut self) -> &mut [Pawn] {
        &mut self.pawns
    }

    pub fn pawn_names(&self) -> Vec<String> {
        self.pawns.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn pawn(&self, name: &str) -> Option<&Pawn> {
        self.pawns.iter().find(|p| p.name() == name)
    }

    pub fn pawn_mut(&mut self, name: &str) -> Option<&mut Pawn> {
        self.pawns.iter_mut().find(|p| p.name() == name)
    }

    pub fn is_occupied(&self) -> bool {
        self.is_occupied
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    /// Binds `player_id` to this quadrant. Fails if already occupied.
    pub fn select(&mut self, player_id: &str) -> Result<(), &'static str> {
        if self.player_id.is_some() {
            return Err("quadrant already selected");
        }
        self.player_id = Some(player_id.to_string());
        self.is_occupied = true;
        Ok(())
    }

    pub fn remove_player(&mut self) {
        self.player_id = None;
        self.is_occupied = false;
    }

    pub fn count_finished_pawns(&self) -> usize {
        self.pawns.iter().filter(|p| p.is_at_finish()).count()
    }

    pub fn has_won(&self) -> bool {
        self.count_finished_pawns() == 4
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub player_id: String,
    pub name: String,
    pub wallet_address: String,
    pub quadrant: Option<String>,
    pub selection_status: SelectionStatus,
    pub connected: bool,
    pub joined_at: chrono::DateTime<chrono::Utc>,
    pub disconnected_at: Option<chrono::DateTime<chrono::Utc>>,
    pub reconnected_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Player {
    pub fn new(player_id: String, name: String, wallet_address: String) -> Self {
        Self {
            player_id,
            name,
            wallet_address,
            quadrant: None,
            selection_status: SelectionStatus::None,
            connected: true,
            joined_at: chrono::Utc::now(),
            disconnected_at: None,
            reconnected_at: None,
        }
    }

    pub fn assign_quadrant(&mut self, quadrant_name: &str) {
        self.quadrant = Some(quadrant_name.to_string());
    }

    pub fn has_selected_quadrant(&self) -> bool {
        self.selection_status == SelectionStatus::Selected
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_pawn_only_moves_on_six() {
        let q = Quadrant::new("QUADRANT_1");
        let pawn = q.pawn("QUADRANT_1_PAWN_1").unwrap();
        assert!(!pawn.is_valid_move(5));
        assert!(pawn.is_valid_move(6));
    }

    #[test]
    fn pawn_enters_then_advances() {
        let mut q = Quadrant::new("QUADRANT_1");
        let pawn = q.pawn_mut("QUADRANT_1_PAWN_1").unwrap();
        let r = pawn.move_pawn(6);
        assert!(r.validation_error.is_none());
        assert_eq!(pawn.position(), Some(board_layout::QUADRANT_1_PATH[0]));
        assert_eq!(pawn.status(), PawnStatus::Playing);

        let r2 = pawn.move_pawn(3);
        assert!(r2.validation_error.is_none());
        assert_eq!(pawn.position(), Some(board_layout::QUADRANT_1_PATH[3]));
    }

    #[test]
    fn pawn_finishes_at_last_cell() {
        let mut q = Quadrant::new("QUADRANT_1");
        let pawn = q.pawn_mut("QUADRANT_1_PAWN_1").unwrap();
        pawn.move_pawn(6); // enter at index 0
        // advance to the last index (56) in one further move of 56 steps
        let r = pawn.move_pawn(56);
        assert!(r.validation_error.is_none());
        assert!(pawn.is_at_finish());
        assert_eq!(pawn.status(), PawnStatus::Finished);
    }

    #[test]
    fn finished_pawn_never_moves_again() {
        let mut q = Quadrant::new("QUADRANT_1");
        let pawn = q.pawn_mut("QUADRANT_1_PAWN_1").unwrap();
        pawn.move_pawn(6);
        pawn.move_pawn(56);
        assert!(!pawn.is_valid_move(1));
    }

    #[test]
    fn quadrant_select_is_idempotent_failing() {
        let mut q = Quadrant::new("QUADRANT_1");
        assert!(q.select("p1").is_ok());
        assert!(q.select("p2").is_err());
    }
}
