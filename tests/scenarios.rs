//! End-to-end scenario tests (S1-S6) against the in-process `Board`, using
//! stub wallet/rng/persistence since a live socket/Mongo/HTTP harness is out
//! of scope for this core.

use std::sync::Arc;

use ludo_arena::board::{Board, DisconnectOutcome, Outbound};
use ludo_arena::expectation::InboundEvent;
use ludo_arena::model::{BoardStatus, RakeKind};
use ludo_arena::persistence::NullBoardStore;
use ludo_arena::rng::StubDice;
use ludo_arena::wallet::StubWallet;

fn new_board(ticket: i64, rake_kind: RakeKind, rake_amount: i64, max_players: u8, dice: Vec<u8>) -> Board {
    Board::new(
        "scenario-board".to_string(),
        max_players,
        true,
        ticket,
        rake_amount,
        rake_kind,
        5,
        Arc::new(StubWallet::default()),
        Arc::new(NullBoardStore),
        Arc::new(StubDice::new(dice)),
    )
}

fn event_names(outbound: &[Outbound]) -> Vec<String> {
    outbound
        .iter()
        .map(|o| match o {
            Outbound::Broadcast(v) | Outbound::Direct(_, v) => {
                v.get("eventName").and_then(|e| e.as_str()).unwrap_or("").to_string()
            }
        })
        .collect()
}

/// S1 — two-player happy path: join, select, start, roll sixes until P1
/// finishes all four pawns and wins the full pool (no rake).
#[tokio::test]
async fn s1_two_player_happy_path_ends_in_a_win() {
    // Entry (6) + nine further sixes walks a pawn from path index 0 to 54;
    // a final roll of 2 lands it exactly on the last cell (index 56). A
    // six or a finish always retains the turn, so P1 alone can walk all
    // four of its pawns home back to back.
    let steps_per_pawn: Vec<u8> = [vec![6u8; 10], vec![2]].concat();
    let dice_script: Vec<u8> = steps_per_pawn.iter().cloned().cycle().take(steps_per_pawn.len() * 4).collect();

    let mut board = new_board(100, RakeKind::Fixed, 0, 2, dice_script);

    board.add_player("p1", "Alice", "0xAlice").await.unwrap();
    let out = board.add_player("p2", "Bob", "0xBob").await.unwrap();
    assert!(event_names(&out).contains(&"Board.WaitingPlayers".to_string()));

    board.select_quadrant("p1", "QUADRANT_1").await.unwrap();
    let out = board.select_quadrant("p2", "QUADRANT_2").await.unwrap();
    assert!(event_names(&out).contains(&"Game.Start".to_string()));
    assert_eq!(board.status(), BoardStatus::Playing);

    let pawns = [
        "QUADRANT_1_PAWN_1",
        "QUADRANT_1_PAWN_2",
        "QUADRANT_1_PAWN_3",
        "QUADRANT_1_PAWN_4",
    ];

    let mut game_ended = false;
    'pawns: for pawn in pawns {
        for &steps in &steps_per_pawn {
            board.dice_roll("p1").await.unwrap();
            let out = board.move_pawn("QUADRANT_1", pawn, steps as i32).await.unwrap();
            if event_names(&out).contains(&"Game.End".to_string()) {
                game_ended = true;
                break 'pawns;
            }
        }
    }

    assert!(game_ended, "expected the fourth pawn home to trigger Game.End");
    assert_eq!(board.status(), BoardStatus::Finished);
}

/// S2 — insufficient balance on bet removes the player without joining them.
#[tokio::test]
async fn s2_insufficient_balance_removes_player() {
    let failing_wallet = Arc::new(StubWallet::default());
    failing_wallet.fail_bet.store(true, std::sync::atomic::Ordering::Relaxed);
    let mut board = Board::new(
        "scenario-board-2".to_string(),
        2,
        true,
        100,
        0,
        RakeKind::Fixed,
        5,
        failing_wallet,
        Arc::new(NullBoardStore),
        Arc::new(StubDice::new(vec![6])),
    );
    board.add_player("p1", "Alice", "0xAlice").await.unwrap();
    board.add_player("p2", "Bob", "0xBob").await.unwrap();

    let out = board.select_quadrant("p1", "QUADRANT_1").await.unwrap();
    assert!(event_names(&out).contains(&"Board.BetFailed".to_string()));
    assert!(!event_names(&out).contains(&"Board.Joined".to_string()));
    assert_eq!(board.status(), BoardStatus::Waiting);
    assert!(board.players().iter().all(|p| p.player_id != "p1"));
}

fn find_pawn_moved(out: &[Outbound]) -> Option<&serde_json::Value> {
    out.iter().find_map(|o| match o {
        Outbound::Broadcast(v) if v.get("eventName").and_then(|e| e.as_str()) == Some("Board.PawnMoved") => Some(v),
        _ => None,
    })
}

/// S3 — capturing a pawn on a non-safe cell sends it home and the capturer
/// keeps the turn. QUADRANT_1 and QUADRANT_2 share the ring cell `7`
/// (QUADRANT_1_PATH[11], QUADRANT_2_PATH[50]) which is not in
/// `safePositions`; P1 is walked there first, then P2 walks onto the same
/// cell to trigger the capture.
#[tokio::test]
async fn s3_capture_on_non_safe_cell_sends_pawn_home() {
    // P1: enter (idx0) -> +6 (idx6) -> +5 (idx11 == cell 7); the final,
    // non-six roll hands the turn to P2.
    let mut board = new_board(100, RakeKind::Fixed, 0, 2, vec![6, 6, 5, 6, 6, 6, 6, 6, 6, 6, 6, 6, 2]);
    board.add_player("p1", "Alice", "0xAlice").await.unwrap();
    board.add_player("p2", "Bob", "0xBob").await.unwrap();
    board.select_quadrant("p1", "QUADRANT_1").await.unwrap();
    board.select_quadrant("p2", "QUADRANT_2").await.unwrap();

    board.dice_roll("p1").await.unwrap();
    board.move_pawn("QUADRANT_1", "QUADRANT_1_PAWN_1", 6).await.unwrap();
    board.dice_roll("p1").await.unwrap();
    board.move_pawn("QUADRANT_1", "QUADRANT_1_PAWN_1", 6).await.unwrap();
    board.dice_roll("p1").await.unwrap();
    board.move_pawn("QUADRANT_1", "QUADRANT_1_PAWN_1", 5).await.unwrap();

    // P2: enter (idx0) -> eight more sixes (idx48) -> +2 (idx50 == cell 7).
    for _ in 0..9 {
        board.dice_roll("p2").await.unwrap();
        board.move_pawn("QUADRANT_2", "QUADRANT_2_PAWN_1", 6).await.unwrap();
    }
    board.dice_roll("p2").await.unwrap();
    let out = board.move_pawn("QUADRANT_2", "QUADRANT_2_PAWN_1", 2).await.unwrap();

    let pawn_moved = find_pawn_moved(&out).expect("a PawnMoved broadcast");
    let captured = pawn_moved["capturedPawns"].as_array().cloned().unwrap_or_default();
    assert_eq!(captured, vec![serde_json::json!("QUADRANT_1_PAWN_1")]);
}

/// S4 — safe-cell protection: P1 walks to cell 23 (QUADRANT_1_PATH[13]),
/// which is in `safePositions`; P2 enters directly onto the same cell
/// (QUADRANT_2_PATH[0] == 23) and no capture occurs.
#[tokio::test]
async fn s4_safe_cell_blocks_capture() {
    let mut board = new_board(100, RakeKind::Fixed, 0, 2, vec![6, 6, 6, 1, 6]);
    board.add_player("p1", "Alice", "0xAlice").await.unwrap();
    board.add_player("p2", "Bob", "0xBob").await.unwrap();
    board.select_quadrant("p1", "QUADRANT_1").await.unwrap();
    board.select_quadrant("p2", "QUADRANT_2").await.unwrap();

    board.dice_roll("p1").await.unwrap();
    board.move_pawn("QUADRANT_1", "QUADRANT_1_PAWN_1", 6).await.unwrap();
    board.dice_roll("p1").await.unwrap();
    board.move_pawn("QUADRANT_1", "QUADRANT_1_PAWN_1", 6).await.unwrap();
    board.dice_roll("p1").await.unwrap();
    board.move_pawn("QUADRANT_1", "QUADRANT_1_PAWN_1", 1).await.unwrap();

    board.dice_roll("p2").await.unwrap();
    let out = board.move_pawn("QUADRANT_2", "QUADRANT_2_PAWN_1", 6).await.unwrap();

    let pawn_moved = find_pawn_moved(&out).expect("a PawnMoved broadcast");
    let captured = pawn_moved["capturedPawns"].as_array().cloned().unwrap_or_default();
    assert!(captured.is_empty());
}

/// S5 — reconnection during a turn re-sends the pending dice roll.
#[tokio::test]
async fn s5_reconnection_resends_pending_dice_roll() {
    let mut board = new_board(100, RakeKind::Fixed, 0, 2, vec![5]);
    board.add_player("p1", "Alice", "0xAlice").await.unwrap();
    board.add_player("p2", "Bob", "0xBob").await.unwrap();
    board.select_quadrant("p1", "QUADRANT_1").await.unwrap();
    board.select_quadrant("p2", "QUADRANT_2").await.unwrap();

    // `set_first_turn` walks quadrants in QUADRANT_1..4 order, so with P1
    // seated at QUADRANT_1 the first turn belongs to P1.
    board.dice_roll("p1").await.unwrap();

    let (out, outcome) = board.handle_disconnection("p1").await.unwrap();
    assert!(event_names(&out).contains(&"Player.Disconnected".to_string()));
    assert!(matches!(outcome, DisconnectOutcome::StartGracePeriod { .. }));

    let out = board.add_player("p1", "Alice", "0xAlice").await.unwrap();
    let names = event_names(&out);
    assert!(names.contains(&"Player.Reconnected".to_string()));
    assert!(names.contains(&"Board.DiceRolled".to_string()));
}

/// S6 — forfeit: remaining connected player wins after the grace period.
#[tokio::test]
async fn s6_forfeit_after_grace_period() {
    let mut board = new_board(100, RakeKind::Fixed, 0, 2, vec![3]);
    board.add_player("p1", "Alice", "0xAlice").await.unwrap();
    board.add_player("p2", "Bob", "0xBob").await.unwrap();
    board.select_quadrant("p1", "QUADRANT_1").await.unwrap();
    board.select_quadrant("p2", "QUADRANT_2").await.unwrap();

    let (_out, outcome) = board.handle_disconnection("p1").await.unwrap();
    let remaining = match outcome {
        DisconnectOutcome::StartGracePeriod { remaining_player_id } => remaining_player_id,
        DisconnectOutcome::Settled => panic!("expected a grace period to start"),
    };
    assert_eq!(remaining, "p2");

    let out = board.recheck_after_grace_period(&remaining).await.unwrap();
    assert!(event_names(&out).contains(&"Game.End".to_string()));
    assert_eq!(board.status(), BoardStatus::Finished);
}
