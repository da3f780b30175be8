//! Compiled-in board layout constants: the bit-exact contract of §6.
//!
//! These never change at runtime; they are the Rust analogue of the
//! original's `ludo_board_constants` package plus the one-row config
//! document it lazily persists on first board creation.

use crate::model::RakeKind;

pub const QUADRANT_NAMES: [&str; 4] = ["QUADRANT_1", "QUADRANT_2", "QUADRANT_3", "QUADRANT_4"];

pub fn quadrant_color(name: &str) -> &'static str {
    match name {
        "QUADRANT_1" => "RED",
        "QUADRANT_2" => "GREEN",
        "QUADRANT_3" => "YELLOW",
        "QUADRANT_4" => "BLUE",
        _ => "UNKNOWN",
    }
}

pub const SAFE_POSITIONS: [i32; 8] = [91, 36, 23, 102, 133, 188, 201, 122];

pub fn is_safe_position(position: i32) -> bool {
    SAFE_POSITIONS.contains(&position)
}

pub const QUADRANT_1_PATH: [i32; 57] = [
    91, 92, 93, 94, 95, 81, 66, 51, 36, 21, 6, 7, 8, 23, 38, 53, 68, 83, 99, 100, 101, 102, 103,
    104, 119, 134, 133, 132, 131, 130, 129, 143, 158, 173, 188, 203, 218, 217, 216, 201, 186, 171,
    156, 141, 125, 124, 123, 122, 121, 120, 105, 106, 107, 108, 109, 110, 111,
];

pub const QUADRANT_2_PATH: [i32; 57] = [
    23, 38, 53, 68, 83, 99, 100, 101, 102, 103, 104, 119, 134, 133, 132, 131, 130, 129, 143, 158,
    173, 188, 203, 218, 217, 216, 201, 186, 171, 156, 141, 125, 124, 123, 122, 121, 120, 105, 90,
    91, 92, 93, 94, 95, 81, 66, 51, 36, 21, 6, 7, 22, 37, 52, 67, 82, 97,
];

pub const QUADRANT_3_PATH: [i32; 57] = [
    133, 132, 131, 130, 129, 143, 158, 173, 188, 203, 218, 217, 216, 201, 186, 171, 156, 141, 125,
    124, 123, 122, 121, 120, 105, 90, 91, 92, 93, 94, 95, 81, 66, 51, 36, 21, 6, 7, 8, 23, 38, 53,
    68, 83, 99, 100, 101, 102, 103, 104, 119, 118, 117, 116, 115, 114, 113,
];

pub const QUADRANT_4_PATH: [i32; 57] = [
    201, 186, 171, 156, 141, 125, 124, 123, 122, 121, 120, 105, 90, 91, 92, 93, 94, 95, 81, 66, 51,
    36, 21, 6, 7, 8, 23, 38, 53, 68, 83, 99, 100, 101, 102, 103, 104, 119, 134, 133, 132, 131, 130,
    129, 143, 158, 173, 188, 203, 218, 217, 202, 187, 172, 157, 142, 127,
];

pub fn quadrant_path(name: &str) -> &'static [i32] {
    match name {
        "QUADRANT_1" => &QUADRANT_1_PATH,
        "QUADRANT_2" => &QUADRANT_2_PATH,
        "QUADRANT_3" => &QUADRANT_3_PATH,
        "QUADRANT_4" => &QUADRANT_4_PATH,
        _ => &[],
    }
}

/// The next quadrant in ring order (1→2→3→4→1), used by `Board::next_turn`.
pub fn next_quadrant_name(name: &str) -> &'static str {
    match name {
        "QUADRANT_1" => "QUADRANT_2",
        "QUADRANT_2" => "QUADRANT_3",
        "QUADRANT_3" => "QUADRANT_4",
        _ => "QUADRANT_1",
    }
}

pub const PLAYERS_REQUIRED_TO_START_GAME: [u8; 2] = [2, 4];
pub const AUTO_PLAY: bool = true;
pub const AUTO_PLAY_TIMER_SECS: u64 = 5;
pub const BOARDS_PER_BUCKET: usize = 6;
pub const TICKET_AMOUNTS: [i64; 3] = [100, 200, 500];

pub fn rake_amount(kind: RakeKind) -> i64 {
    match kind {
        RakeKind::Fixed => 0,
        RakeKind::Percentage => 10,
    }
}

pub const EXPECTATION_TIMEOUT_SECS: u64 = 30;
pub const GRACE_PERIOD_SECS: u64 = 30;
pub const DICE_PACING_MS: u64 = 300;
pub const HEARTBEAT_INTERVAL_SECS: u64 = 5;
pub const READ_DEADLINE_SECS: u64 = 15;
