//! Copy-able 8x8 symbol grid used inside the search.
//!
//! Squares hold the same symbols as [`Board::to_matrix`]: lowercase for
//! White, uppercase for Black, a space for empty. Castling rights and the
//! en-passant file are tracked as flags so the grid can be copied cheaply.

use std::fmt;

use crate::board::{write_grid, Board, Coord, PieceColour, PieceKind, KING_HOME_COL};
use crate::movegen::{DIAGONAL_RAYS, KING_OFFSETS, KNIGHT_OFFSETS, STRAIGHT_RAYS};

pub const EMPTY: u8 = b' ';

const QUEEN_SIDE: usize = 0;
const KING_SIDE: usize = 1;

/// A move between two squares of a [`CompactBoard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompactMove {
    pub from: Coord,
    pub to: Coord,
}

impl CompactMove {
    pub const fn new(from: Coord, to: Coord) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for CompactMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactBoard {
    grid: [[u8; 8]; 8],
    king_unmoved: [bool; 2],
    rook_unmoved: [[bool; 2]; 2],
    /// File of a pawn that double-stepped on the previous ply.
    double_step: Option<u8>,
    turn: PieceColour,
}

impl Default for CompactBoard {
    fn default() -> Self {
        CompactBoard::new()
    }
}

impl From<&Board> for CompactBoard {
    fn from(board: &Board) -> Self {
        let mut compact = CompactBoard::empty();
        compact.grid = board.to_matrix();
        compact.turn = board.turn();
        compact.double_step = board.en_passant_target().map(|target| target.col());
        for colour in [PieceColour::White, PieceColour::Black] {
            let side = colour.index();
            compact.king_unmoved[side] = board.king_can_castle(colour);
            compact.rook_unmoved[side][QUEEN_SIDE] = board.rook_can_castle(colour, false);
            compact.rook_unmoved[side][KING_SIDE] = board.rook_can_castle(colour, true);
        }
        compact
    }
}

impl CompactBoard {
    /// The standard opening position.
    pub fn new() -> Self {
        CompactBoard::from(&Board::new())
    }

    pub fn empty() -> Self {
        Self {
            grid: [[EMPTY; 8]; 8],
            king_unmoved: [false; 2],
            rook_unmoved: [[false; 2]; 2],
            double_step: None,
            turn: PieceColour::White,
        }
    }

    #[inline]
    pub fn copy(&self) -> CompactBoard {
        *self
    }

    #[inline]
    pub fn symbol_at(&self, coord: Coord) -> u8 {
        self.grid[coord.row() as usize][coord.col() as usize]
    }

    #[inline]
    fn set(&mut self, coord: Coord, symbol: u8) {
        self.grid[coord.row() as usize][coord.col() as usize] = symbol;
    }

    pub fn piece_at(&self, coord: Coord) -> Option<(PieceKind, PieceColour)> {
        let symbol = self.symbol_at(coord);
        Some((
            PieceKind::from_letter(symbol)?,
            PieceColour::of_symbol(symbol)?,
        ))
    }

    pub fn place(&mut self, coord: Coord, kind: PieceKind, colour: PieceColour) {
        self.set(coord, colour.symbol(kind));
    }

    pub fn clear(&mut self, coord: Coord) {
        self.set(coord, EMPTY);
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Coord, PieceKind, PieceColour)> + '_ {
        Coord::all().filter_map(move |coord| {
            self.piece_at(coord)
                .map(|(kind, colour)| (coord, kind, colour))
        })
    }

    pub fn turn(&self) -> PieceColour {
        self.turn
    }

    pub fn set_turn(&mut self, colour: PieceColour) {
        self.turn = colour;
    }

    pub fn double_step_file(&self) -> Option<u8> {
        self.double_step
    }

    /// Neither the king nor the rook on that side has moved.
    pub fn can_castle(&self, colour: PieceColour, king_side: bool) -> bool {
        let side = if king_side { KING_SIDE } else { QUEEN_SIDE };
        self.king_unmoved[colour.index()] && self.rook_unmoved[colour.index()][side]
    }

    fn is_enemy(&self, coord: Coord, colour: PieceColour) -> bool {
        PieceColour::of_symbol(self.symbol_at(coord)) == Some(colour.invert())
    }

    fn is_landable(&self, coord: Coord, colour: PieceColour) -> bool {
        PieceColour::of_symbol(self.symbol_at(coord)) != Some(colour)
    }

    /// Moves that respect piece movement only; the mover's king may be left attacked.
    pub fn pseudo_legal_moves(&self) -> Vec<CompactMove> {
        let mut moves = Vec::with_capacity(48);
        for from in Coord::all() {
            let Some((kind, colour)) = self.piece_at(from) else {
                continue;
            };
            if colour != self.turn {
                continue;
            }
            match kind {
                PieceKind::Pawn => self.pawn_moves(from, colour, &mut moves),
                PieceKind::Knight => self.step_moves(from, colour, &KNIGHT_OFFSETS, &mut moves),
                PieceKind::Bishop => self.ray_moves(from, colour, &DIAGONAL_RAYS, &mut moves),
                PieceKind::Rook => self.ray_moves(from, colour, &STRAIGHT_RAYS, &mut moves),
                PieceKind::Queen => {
                    self.ray_moves(from, colour, &STRAIGHT_RAYS, &mut moves);
                    self.ray_moves(from, colour, &DIAGONAL_RAYS, &mut moves);
                }
                PieceKind::King => {
                    self.step_moves(from, colour, &KING_OFFSETS, &mut moves);
                    self.castle_moves(from, colour, &mut moves);
                }
            }
        }
        moves
    }

    /// Legal moves of the side to move. Matches [`Board::legal_moves`] on the
    /// same position.
    pub fn legal_moves(&self) -> Vec<CompactMove> {
        let colour = self.turn;
        self.pseudo_legal_moves()
            .into_iter()
            .filter(|&mv| {
                let mut trial = self.copy();
                trial.make_move(mv);
                !trial.is_king_in_check(colour)
            })
            .collect()
    }

    fn step_moves(
        &self,
        from: Coord,
        colour: PieceColour,
        offsets: &[(i8, i8)],
        moves: &mut Vec<CompactMove>,
    ) {
        for &(dr, dc) in offsets {
            if let Some(to) = from.offset(dr, dc) {
                if self.is_landable(to, colour) {
                    moves.push(CompactMove::new(from, to));
                }
            }
        }
    }

    fn ray_moves(
        &self,
        from: Coord,
        colour: PieceColour,
        rays: &[(i8, i8)],
        moves: &mut Vec<CompactMove>,
    ) {
        for &(dr, dc) in rays {
            let mut cursor = from.offset(dr, dc);
            while let Some(to) = cursor {
                match PieceColour::of_symbol(self.symbol_at(to)) {
                    None => moves.push(CompactMove::new(from, to)),
                    Some(other) => {
                        if other != colour {
                            moves.push(CompactMove::new(from, to));
                        }
                        break;
                    }
                }
                cursor = to.offset(dr, dc);
            }
        }
    }

    fn pawn_moves(&self, from: Coord, colour: PieceColour, moves: &mut Vec<CompactMove>) {
        let dir = colour.pawn_direction();
        let Some(ahead) = from.offset(dir, 0) else {
            return;
        };

        if self.symbol_at(ahead) == EMPTY {
            moves.push(CompactMove::new(from, ahead));
            if from.row() == colour.pawn_start_row() {
                if let Some(two_ahead) = ahead.offset(dir, 0) {
                    if self.symbol_at(two_ahead) == EMPTY {
                        moves.push(CompactMove::new(from, two_ahead));
                    }
                }
            }
        }

        for dc in [-1, 1] {
            let Some(to) = from.offset(dir, dc) else {
                continue;
            };
            if self.is_enemy(to, colour) || self.is_en_passant_capture(from, to, colour) {
                moves.push(CompactMove::new(from, to));
            }
        }
    }

    fn is_en_passant_capture(&self, from: Coord, to: Coord, colour: PieceColour) -> bool {
        let enemy = colour.invert();
        // Row a double-stepped enemy pawn lands on
        let landing_row = (enemy.pawn_start_row() as i8 + 2 * enemy.pawn_direction()) as u8;
        self.double_step == Some(to.col())
            && from.row() == landing_row
            && self.symbol_at(to) == EMPTY
            && Coord::new(from.row(), to.col())
                .is_some_and(|beside| self.piece_at(beside) == Some((PieceKind::Pawn, enemy)))
    }

    fn castle_moves(&self, from: Coord, colour: PieceColour, moves: &mut Vec<CompactMove>) {
        let row = colour.back_row();
        if from != Coord::at(row, KING_HOME_COL) || !self.king_unmoved[colour.index()] {
            return;
        }
        let enemy = colour.invert();
        let mut king_attacked = None;

        for (side, rook_col, dc) in [(KING_SIDE, 7u8, 1i8), (QUEEN_SIDE, 0u8, -1i8)] {
            if !self.rook_unmoved[colour.index()][side]
                || self.piece_at(Coord::at(row, rook_col)) != Some((PieceKind::Rook, colour))
            {
                continue;
            }
            let between = if side == KING_SIDE { 5..7 } else { 1..4 };
            if between.into_iter().any(|col| self.grid[row as usize][col] != EMPTY) {
                continue;
            }
            if *king_attacked.get_or_insert_with(|| self.is_square_attacked(from, enemy)) {
                return;
            }
            let (Some(passed), Some(to)) = (from.offset(0, dc), from.offset(0, 2 * dc)) else {
                continue;
            };
            if !self.is_square_attacked(passed, enemy) {
                moves.push(CompactMove::new(from, to));
            }
        }
    }

    pub fn is_square_attacked(&self, target: Coord, by: PieceColour) -> bool {
        let holds = |coord: Option<Coord>, kinds: &[PieceKind]| {
            coord
                .and_then(|c| self.piece_at(c))
                .is_some_and(|(kind, colour)| colour == by && kinds.contains(&kind))
        };

        // A pawn attacks from one row behind the target in its own direction
        let dir = by.pawn_direction();
        if [-1, 1]
            .into_iter()
            .any(|dc| holds(target.offset(-dir, dc), &[PieceKind::Pawn]))
        {
            return true;
        }
        if KNIGHT_OFFSETS
            .iter()
            .any(|&(dr, dc)| holds(target.offset(dr, dc), &[PieceKind::Knight]))
        {
            return true;
        }
        if KING_OFFSETS
            .iter()
            .any(|&(dr, dc)| holds(target.offset(dr, dc), &[PieceKind::King]))
        {
            return true;
        }

        let slides = [
            (&STRAIGHT_RAYS, [PieceKind::Rook, PieceKind::Queen]),
            (&DIAGONAL_RAYS, [PieceKind::Bishop, PieceKind::Queen]),
        ];
        for (rays, sliders) in slides {
            for &(dr, dc) in rays {
                let mut cursor = target.offset(dr, dc);
                while let Some(square) = cursor {
                    if self.symbol_at(square) != EMPTY {
                        if holds(Some(square), &sliders) {
                            return true;
                        }
                        break;
                    }
                    cursor = square.offset(dr, dc);
                }
            }
        }
        false
    }

    pub fn king_square(&self, colour: PieceColour) -> Option<Coord> {
        let king = colour.symbol(PieceKind::King);
        Coord::all().find(|&coord| self.symbol_at(coord) == king)
    }

    pub fn is_king_in_check(&self, colour: PieceColour) -> bool {
        self.king_square(colour)
            .is_some_and(|king| self.is_square_attacked(king, colour.invert()))
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_king_in_check(self.turn) && self.legal_moves().is_empty()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_king_in_check(self.turn) && self.legal_moves().is_empty()
    }

    /// Plays a move without validation. Pawns reaching the last rank become queens.
    pub fn make_move(&mut self, mv: CompactMove) {
        let CompactMove { from, to } = mv;
        let Some((kind, colour)) = self.piece_at(from) else {
            return;
        };
        let (dr, dc) = from.delta(to);
        let previous_double_step = self.double_step.take();
        let mut landing = self.symbol_at(from);

        match kind {
            PieceKind::King => {
                self.king_unmoved[colour.index()] = false;
                if dr == 0 && dc.abs() == 2 {
                    let rook_from = Coord::at(from.row(), if dc > 0 { 7 } else { 0 });
                    if let Some(rook_to) = from.offset(0, dc.signum()) {
                        let rook = self.symbol_at(rook_from);
                        self.set(rook_from, EMPTY);
                        self.set(rook_to, rook);
                    }
                    self.clear_rook_right(rook_from);
                }
            }
            PieceKind::Pawn => {
                if dr.abs() == 2 {
                    self.double_step = Some(from.col());
                }
                if dc != 0 && self.symbol_at(to) == EMPTY && previous_double_step == Some(to.col())
                {
                    self.set(Coord::at(from.row(), to.col()), EMPTY);
                }
                if to.row() == colour.promotion_row() {
                    landing = colour.symbol(PieceKind::Queen);
                }
            }
            _ => {}
        }

        self.clear_rook_right(from);
        self.clear_rook_right(to);
        self.set(to, landing);
        self.set(from, EMPTY);
        self.turn = self.turn.invert();
    }

    /// A move from or onto a corner ends castling on that side for good.
    fn clear_rook_right(&mut self, square: Coord) {
        for colour in [PieceColour::White, PieceColour::Black] {
            if square.row() != colour.back_row() {
                continue;
            }
            match square.col() {
                0 => self.rook_unmoved[colour.index()][QUEEN_SIDE] = false,
                7 => self.rook_unmoved[colour.index()][KING_SIDE] = false,
                _ => {}
            }
        }
    }
}

impl fmt::Display for CompactBoard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_grid(f, |coord| self.symbol_at(coord))
    }
}
