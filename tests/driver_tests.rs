use std::thread;
use std::time::{Duration, Instant};

use lightboard::{
    Board, ChessDriver, ChessError, Coord, GameState, IllegalMoveReason, PieceColour, PieceKind,
    SearchConfig, SpecialMove,
};

fn sq(name: &str) -> Coord {
    name.parse().unwrap()
}

fn computer_config() -> SearchConfig {
    SearchConfig::deterministic().with_depth(2)
}

#[test]
fn legal_move_set_is_a_pure_query() {
    let driver = ChessDriver::new();
    let before = driver.board().clone();

    let first = driver.legal_move_set(sq("b1"));
    let second = driver.legal_move_set(sq("b1"));
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert!(driver.legal_move_set(sq("e4")).is_empty());
    assert_eq!(driver.board(), &before);
}

#[test]
fn attempt_move_applies_or_rejects() -> anyhow::Result<()> {
    let mut driver = ChessDriver::new();

    let err = driver.attempt_move(sq("e7"), sq("e5")).unwrap_err();
    assert!(matches!(
        err,
        ChessError::IllegalMove {
            reason: IllegalMoveReason::WrongTurn,
            ..
        }
    ));
    assert_eq!(driver.turn(), PieceColour::White);

    let report = driver.attempt_move(sq("e2"), sq("e4"))?;
    assert_eq!(report.special, SpecialMove::None);
    assert!(!report.checkmate);
    assert_eq!(driver.turn(), PieceColour::Black);

    let snapshot = driver.position_snapshot();
    assert_eq!(snapshot[3][4], Some((PieceKind::Pawn, PieceColour::White)));
    assert_eq!(snapshot[1][4], None);
    assert_eq!(snapshot[7][3], Some((PieceKind::Queen, PieceColour::Black)));
    Ok(())
}

#[test]
fn fools_mate_ends_the_game() -> anyhow::Result<()> {
    let mut driver = ChessDriver::new();
    for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4")] {
        driver.attempt_move(sq(from), sq(to))?;
    }
    assert!(!driver.is_game_over());

    let report = driver.attempt_move(sq("d8"), sq("h4"))?;
    assert!(report.checkmate);
    assert!(driver.is_game_over());
    assert_eq!(driver.winner(), Some(PieceColour::Black));
    assert!(driver.legal_moves().is_empty());
    Ok(())
}

#[test]
fn promotion_is_resolved_once() -> anyhow::Result<()> {
    let board = Board::from_fen("7k/1P6/6K1/8/8/8/8/8 w - - 0 1")?;
    let mut driver = ChessDriver::from_board(board);

    let report = driver.attempt_move(sq("b7"), sq("b8"))?;
    assert_eq!(report.special, SpecialMove::PromotionPending);
    assert_eq!(driver.special_situation(), SpecialMove::PromotionPending);
    assert_eq!(driver.promoting_square(), Some(sq("b8")));
    assert_eq!(driver.status(), GameState::PromotionPending);

    // Play is suspended until the pawn is replaced
    assert!(driver.attempt_move(sq("h8"), sq("h7")).is_err());

    assert!(matches!(
        driver.resolve_promotion(sq("b8"), PieceKind::Queen, PieceColour::Black),
        Err(ChessError::PromotionColourMismatch { .. })
    ));
    assert!(matches!(
        driver.resolve_promotion(sq("b8"), PieceKind::Pawn, PieceColour::White),
        Err(ChessError::InvalidPromotion { .. })
    ));

    assert!(driver.resolve_promotion(sq("b8"), PieceKind::Rook, PieceColour::White)?);
    assert_eq!(driver.promoting_square(), None);
    assert_eq!(driver.winner(), Some(PieceColour::White));

    assert!(matches!(
        driver.resolve_promotion(sq("b8"), PieceKind::Queen, PieceColour::White),
        Err(ChessError::PromotionAlreadyResolved { .. })
    ));
    assert!(matches!(
        driver.resolve_promotion(sq("c8"), PieceKind::Queen, PieceColour::White),
        Err(ChessError::PromotionNotPending { .. })
    ));
    Ok(())
}

#[test]
fn computer_replies_to_a_human_move() -> anyhow::Result<()> {
    let mut driver = ChessDriver::new().with_computer(PieceColour::Black, computer_config());
    assert!(driver.is_computer_game());
    assert_eq!(driver.computer_colour(), Some(PieceColour::Black));

    driver.attempt_move(sq("e2"), sq("e4"))?;
    driver.request_computer_move(PieceColour::Black)?;

    // Human input is refused while the computer thinks
    let err = driver.attempt_move(sq("d2"), sq("d4")).unwrap_err();
    assert!(matches!(
        err,
        ChessError::IllegalMove {
            reason: IllegalMoveReason::SearchInProgress,
            ..
        }
    ));
    assert!(matches!(
        driver.request_computer_move(PieceColour::Black),
        Err(ChessError::SearchInProgress)
    ));

    driver.play_computer_move()?;
    assert_eq!(driver.turn(), PieceColour::White);
    assert!(!driver.computer_move_ready());
    assert_eq!(driver.board().roster().len(), 32);
    Ok(())
}

#[test]
fn await_returns_a_legal_move_without_playing_it() -> anyhow::Result<()> {
    let mut driver = ChessDriver::new().with_computer(PieceColour::White, computer_config());
    driver.request_computer_move(PieceColour::White)?;
    let mv = driver.await_computer_move()?;

    assert!(driver.legal_moves().contains(&mv));
    assert_eq!(driver.board(), &Board::new());
    assert!(matches!(
        driver.await_computer_move(),
        Err(ChessError::NoSearchPending)
    ));
    Ok(())
}

#[test]
fn polling_reports_a_finished_search() -> anyhow::Result<()> {
    let mut driver = ChessDriver::new().with_computer(PieceColour::White, computer_config());
    driver.request_computer_move(PieceColour::White)?;

    let deadline = Instant::now() + Duration::from_secs(30);
    while !driver.computer_move_ready() {
        assert!(Instant::now() < deadline, "search never finished");
        thread::sleep(Duration::from_millis(5));
    }
    // still ready until the move is collected
    assert!(driver.computer_move_ready());

    let mv = driver.await_computer_move()?;
    assert!(driver.legal_moves().contains(&mv));
    assert!(!driver.computer_move_ready());
    Ok(())
}

#[test]
fn computer_waits_for_a_pending_promotion() -> anyhow::Result<()> {
    let board = Board::from_fen("7k/1P6/6K1/8/8/8/8/8 w - - 0 1")?;
    let mut driver =
        ChessDriver::from_board(board).with_computer(PieceColour::Black, computer_config());

    driver.attempt_move(sq("b7"), sq("b8"))?;
    assert!(matches!(
        driver.request_computer_move(PieceColour::Black),
        Err(ChessError::PromotionUnresolved { square }) if square == sq("b8")
    ));
    assert!(!driver.computer_move_ready());

    assert!(!driver.resolve_promotion(sq("b8"), PieceKind::Knight, PieceColour::White)?);
    driver.request_computer_move(PieceColour::Black)?;
    driver.play_computer_move()?;
    assert_eq!(driver.turn(), PieceColour::White);
    Ok(())
}

#[test]
fn computer_requests_are_validated() {
    let mut human_only = ChessDriver::new();
    assert!(matches!(
        human_only.request_computer_move(PieceColour::White),
        Err(ChessError::NoComputerPlayer(PieceColour::White))
    ));

    let mut driver = ChessDriver::new().with_computer(PieceColour::Black, computer_config());
    assert!(matches!(
        driver.request_computer_move(PieceColour::White),
        Err(ChessError::NoComputerPlayer(PieceColour::White))
    ));
    assert!(matches!(
        driver.request_computer_move(PieceColour::Black),
        Err(ChessError::NotComputersTurn(PieceColour::Black))
    ));
    assert!(!driver.computer_move_ready());
}

#[test]
fn computer_promotes_to_a_queen() -> anyhow::Result<()> {
    let board = Board::from_fen("7k/8/8/8/8/6K1/p7/8 b - - 0 1")?;
    let mut driver = ChessDriver::from_board(board)
        .with_computer(PieceColour::Black, SearchConfig::deterministic().with_depth(1));

    driver.request_computer_move(PieceColour::Black)?;
    let report = driver.play_computer_move()?;
    assert_eq!(report.special, SpecialMove::PromotionPending);
    assert_eq!(driver.promoting_square(), None);
    assert_eq!(
        driver.position_snapshot()[0][0],
        Some((PieceKind::Queen, PieceColour::Black))
    );
    assert_eq!(driver.turn(), PieceColour::White);
    Ok(())
}

#[test]
fn no_move_for_a_stalemated_computer() -> anyhow::Result<()> {
    let board = Board::from_fen("k7/2Q5/1K6/8/8/8/8/8 b - - 0 1")?;
    let mut driver =
        ChessDriver::from_board(board).with_computer(PieceColour::Black, computer_config());
    assert_eq!(driver.status(), GameState::Stalemate);
    assert!(!driver.is_game_over());

    driver.request_computer_move(PieceColour::Black)?;
    assert!(matches!(
        driver.play_computer_move(),
        Err(ChessError::NoComputerMoveAvailable)
    ));
    Ok(())
}

#[test]
fn search_can_be_abandoned() -> anyhow::Result<()> {
    let config = SearchConfig::deterministic().with_depth(6);
    let mut driver = ChessDriver::new().with_computer(PieceColour::White, config);
    driver.request_computer_move(PieceColour::White)?;
    driver.cancel_computer_move()?;

    assert!(!driver.computer_move_ready());
    driver.attempt_move(sq("d2"), sq("d4"))?;
    Ok(())
}
