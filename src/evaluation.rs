use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::{Board, PieceColour, PieceKind};
use crate::compact::CompactBoard;

/// Material-only static evaluation. White scores positive, Black negative.
#[derive(Debug, Clone)]
pub struct Evaluator {
    // Piece values
    pub pawn_value: f32,
    pub knight_value: f32,
    pub bishop_value: f32,
    pub rook_value: f32,
    pub queen_value: f32,

    // Tie-break noise for the compact evaluator
    jitter: Option<StdRng>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            pawn_value: 1.0,
            knight_value: 3.0,
            bishop_value: 3.0,
            rook_value: 5.0,
            queen_value: 9.0,
            jitter: None,
        }
    }

    /// Evaluator whose compact scores carry noise in `[-0.5, 0.5)`.
    /// Without a seed the generator is seeded from the OS.
    pub fn with_jitter(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            jitter: Some(rng),
            ..Self::new()
        }
    }

    pub fn has_jitter(&self) -> bool {
        self.jitter.is_some()
    }

    pub fn piece_value(&self, kind: PieceKind) -> f32 {
        match kind {
            PieceKind::Pawn => self.pawn_value,
            PieceKind::Knight => self.knight_value,
            PieceKind::Bishop => self.bishop_value,
            PieceKind::Rook => self.rook_value,
            PieceKind::Queen => self.queen_value,
            PieceKind::King => 0.0,
        }
    }

    fn signed_value(&self, kind: PieceKind, colour: PieceColour) -> f32 {
        match colour {
            PieceColour::White => self.piece_value(kind),
            PieceColour::Black => -self.piece_value(kind),
        }
    }

    pub fn evaluate(&self, board: &Board) -> f32 {
        board
            .pieces()
            .map(|(_, piece)| self.signed_value(piece.kind(), piece.colour()))
            .sum()
    }

    pub fn evaluate_compact(&mut self, board: &CompactBoard) -> f32 {
        let material: f32 = board
            .pieces()
            .map(|(_, kind, colour)| self.signed_value(kind, colour))
            .sum();
        material + self.noise()
    }

    fn noise(&mut self) -> f32 {
        self.jitter
            .as_mut()
            .map_or(0.0, |rng| rng.gen::<f32>() - 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Coord;

    #[test]
    fn test_start_position_is_balanced() {
        let evaluator = Evaluator::new();
        assert!(!evaluator.has_jitter());
        assert_eq!(evaluator.evaluate(&Board::new()), 0.0);
    }

    #[test]
    fn test_material_sign() {
        let mut board = Board::empty();
        board.spawn(Coord::new(0, 0).unwrap(), PieceKind::Queen, PieceColour::White);
        board.spawn(Coord::new(7, 7).unwrap(), PieceKind::Rook, PieceColour::Black);
        board.spawn(Coord::new(6, 6).unwrap(), PieceKind::Pawn, PieceColour::Black);
        let mut evaluator = Evaluator::new();
        assert_eq!(evaluator.evaluate(&board), 3.0);
        assert_eq!(evaluator.evaluate_compact(&CompactBoard::from(&board)), 3.0);
    }

    #[test]
    fn test_jitter_is_bounded_and_seeded() {
        let board = CompactBoard::new();
        let mut a = Evaluator::with_jitter(Some(42));
        let mut b = Evaluator::with_jitter(Some(42));
        assert!(a.has_jitter());
        for _ in 0..100 {
            let score = a.evaluate_compact(&board);
            assert!((-0.5..0.5).contains(&score));
            assert_eq!(score, b.evaluate_compact(&board));
        }
    }
}
