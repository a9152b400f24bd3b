use std::collections::BTreeSet;

use lightboard::{
    Board, CompactBoard, CompactMove, Coord, GameState, Layout, PieceColour, PieceKind,
    SpecialMove,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sq(name: &str) -> Coord {
    name.parse().unwrap()
}

fn board_move_set(board: &Board) -> BTreeSet<(Coord, Coord)> {
    board
        .legal_moves()
        .iter()
        .filter_map(|mv| mv.endpoints(board))
        .collect()
}

fn compact_move_set(board: &CompactBoard) -> BTreeSet<(Coord, Coord)> {
    board
        .legal_moves()
        .into_iter()
        .map(|mv| (mv.from, mv.to))
        .collect()
}

fn assert_moves_are_safe(board: &Board) {
    let mover = board.turn();
    for mv in board.legal_moves() {
        let (origin, dest) = mv.endpoints(board).unwrap();
        let mut trial = board.deepcopy();
        trial.move_piece(origin, dest).unwrap();
        assert!(
            !trial.is_king_in_check(mover),
            "{} leaves the king in check",
            mv.describe(board)
        );
    }
}

#[test]
fn legal_moves_never_leave_the_king_in_check() {
    let mut layouts = vec![Layout::Standard, Layout::Promotion, Layout::Empty];
    layouts.extend((0..20).map(|seed| Layout::Random { seed }));

    for layout in layouts {
        let mut board = Board::with_layout(layout);
        for colour in [PieceColour::White, PieceColour::Black] {
            board.set_turn(colour);
            assert_moves_are_safe(&board);
        }
    }

    let pinned = Board::from_fen("4k3/8/8/8/1b6/8/3P4/4K3 w - - 0 1").unwrap();
    assert!(pinned.legal_moves_from(sq("d2")).is_empty());
    assert_moves_are_safe(&pinned);
}

#[test]
fn random_layouts_agree_across_representations() {
    for seed in 0..50 {
        let mut board = Board::with_layout(Layout::Random { seed });
        for colour in [PieceColour::White, PieceColour::Black] {
            board.set_turn(colour);
            let compact = CompactBoard::from(&board);
            assert_eq!(
                board_move_set(&board),
                compact_move_set(&compact),
                "seed {seed}, {colour:?} to move\n{board}"
            );
        }
    }
}

#[test]
fn random_games_agree_across_representations() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..8 {
        let mut board = Board::new();
        let mut compact = CompactBoard::new();

        for _ in 0..60 {
            let moves = board_move_set(&board);
            assert_eq!(moves, compact_move_set(&compact), "\n{board}");
            assert_moves_are_safe(&board);
            if moves.is_empty() {
                break;
            }

            let (origin, dest) = *moves.iter().nth(rng.gen_range(0..moves.len())).unwrap();
            let mover = board.turn();
            let outcome = board.try_move(origin, dest)?;
            if outcome.special == SpecialMove::PromotionPending {
                board.promote(dest, PieceKind::Queen, mover)?;
            }
            compact.make_move(CompactMove::new(origin, dest));
            assert_eq!(CompactBoard::from(&board), compact);
        }
    }
    Ok(())
}

#[test]
fn deepcopy_is_independent() -> anyhow::Result<()> {
    let board = Board::new();
    let snapshot = board.clone();

    let mut copy = board.deepcopy();
    copy.try_move(sq("e2"), sq("e4"))?;
    copy.try_move(sq("d7"), sq("d5"))?;
    copy.try_move(sq("e4"), sq("d5"))?;

    assert_eq!(board, snapshot);
    assert_eq!(board.roster().len(), 32);
    assert_eq!(copy.roster().len(), 31);
    Ok(())
}

#[test]
fn en_passant_expires_after_one_ply() -> anyhow::Result<()> {
    let mut board = Board::new();
    for (from, to) in [("e2", "e4"), ("h7", "h6"), ("e4", "e5"), ("f7", "f5")] {
        board.try_move(sq(from), sq(to))?;
    }
    assert!(board.is_legal_move(sq("e5"), sq("f6")));

    board.try_move(sq("b1"), sq("c3"))?;
    board.try_move(sq("h6"), sq("h5"))?;
    assert_eq!(board.en_passant_target(), None);
    assert!(!board.is_legal_move(sq("e5"), sq("f6")));
    Ok(())
}

#[test]
fn en_passant_removes_the_right_pawn() -> anyhow::Result<()> {
    let mut board = Board::from_fen("4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1")?;
    board.try_move(sq("e2"), sq("e4"))?;
    let captured = board.piece_id_at(sq("e4")).unwrap();

    let outcome = board.try_move(sq("d4"), sq("e3"))?;
    assert_eq!(outcome.special, SpecialMove::EnPassant);
    assert_eq!(board.position_of(captured), None);
    assert!(board.piece_at(sq("e4")).is_none());
    assert_eq!(board.piece_at(sq("e3")).unwrap().colour(), PieceColour::Black);
    assert!(!board.roster().contains(&captured));
    Ok(())
}

#[test]
fn castling_rights_are_lost_for_good() -> anyhow::Result<()> {
    let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1")?;

    board.try_move(sq("e1"), sq("f1"))?;
    board.try_move(sq("a8"), sq("b8"))?;
    board.try_move(sq("f1"), sq("e1"))?;
    board.try_move(sq("b8"), sq("a8"))?;

    // The king is home again but has moved
    assert!(!board.castling_right(PieceColour::White, true));
    assert!(!board.castling_right(PieceColour::White, false));
    assert!(!board.is_legal_move(sq("e1"), sq("g1")));

    // Black's king-side right survives the queen-side rook trip
    assert!(board.castling_right(PieceColour::Black, true));
    assert!(!board.castling_right(PieceColour::Black, false));
    board.try_move(sq("a1"), sq("a2"))?;
    assert!(board.is_legal_move(sq("e8"), sq("g8")));
    assert!(!board.is_legal_move(sq("e8"), sq("c8")));
    Ok(())
}

#[test]
fn castling_through_an_attacked_square_is_illegal() -> anyhow::Result<()> {
    let board = Board::from_fen("4k3/8/8/8/8/8/5r2/R3K2R w KQ - 0 1")?;
    assert!(!board.is_king_in_check(PieceColour::White));
    assert!(!board.is_legal_move(sq("e1"), sq("g1")));
    assert!(board.is_legal_move(sq("e1"), sq("c1")));
    Ok(())
}

#[test]
fn back_rank_mate() -> anyhow::Result<()> {
    let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1")?;
    let outcome = board.try_move(sq("a1"), sq("a8"))?;

    assert!(outcome.checkmate);
    assert!(board.is_checkmate());
    assert_eq!(board.game_state(), GameState::Checkmate(PieceColour::White));
    assert!(board.legal_moves().is_empty());
    assert!(board.legal_moves_from(sq("g8")).is_empty());
    assert!(CompactBoard::from(&board).is_checkmate());
    Ok(())
}

#[test]
fn checkmate_waits_for_promotion() -> anyhow::Result<()> {
    // b8 mates once the pawn becomes a queen or rook
    let mut board = Board::from_fen("7k/1P6/6K1/8/8/8/8/8 w - - 0 1")?;
    let outcome = board.try_move(sq("b7"), sq("b8"))?;
    assert_eq!(outcome.special, SpecialMove::PromotionPending);
    assert!(!outcome.checkmate);
    assert!(!board.is_checkmate());

    assert!(board.promote(sq("b8"), PieceKind::Queen, PieceColour::White)?);
    assert_eq!(board.game_state(), GameState::Checkmate(PieceColour::White));
    Ok(())
}

#[test]
fn missing_king_is_never_in_check() {
    let mut board = Board::empty();
    board.spawn(sq("d4"), PieceKind::Queen, PieceColour::Black);
    assert!(!board.is_king_in_check(PieceColour::White));
    assert_eq!(board.game_state(), GameState::Stalemate);
}
