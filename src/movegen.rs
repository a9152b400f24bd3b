use std::fmt;

use tracing::{debug, trace};

use crate::board::{Board, Coord, Piece, PieceColour, PieceId, PieceKind, KING_HOME_COL};
use crate::error::{ChessError, ChessResult, IllegalMoveReason};

pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub(crate) const STRAIGHT_RAYS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub(crate) const DIAGONAL_RAYS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// A piece and the displacement it travels. The origin is wherever the piece
/// currently stands on the board the move is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    piece: PieceId,
    delta_row: i8,
    delta_col: i8,
}

impl Move {
    /// Placeholder for "no move found".
    pub const NULL: Move = Move {
        piece: PieceId(usize::MAX),
        delta_row: 0,
        delta_col: 0,
    };

    pub const fn new(piece: PieceId, delta_row: i8, delta_col: i8) -> Self {
        Self {
            piece,
            delta_row,
            delta_col,
        }
    }

    pub fn piece(&self) -> PieceId {
        self.piece
    }

    pub fn delta(&self) -> (i8, i8) {
        (self.delta_row, self.delta_col)
    }

    pub fn is_null(&self) -> bool {
        *self == Move::NULL
    }

    pub fn origin(&self, board: &Board) -> Option<Coord> {
        board.position_of(self.piece)
    }

    pub fn destination(&self, board: &Board) -> Option<Coord> {
        self.origin(board)?.offset(self.delta_row, self.delta_col)
    }

    /// Origin and destination on `board`, `None` if the piece is gone.
    pub fn endpoints(&self, board: &Board) -> Option<(Coord, Coord)> {
        let origin = self.origin(board)?;
        Some((origin, origin.offset(self.delta_row, self.delta_col)?))
    }

    /// Human readable form, e.g. `White Knight b1-c3`.
    pub fn describe(&self, board: &Board) -> String {
        match (board.piece(self.piece), self.endpoints(board)) {
            (Some(piece), Some((origin, dest))) => {
                format!("{:?} {:?} {origin}-{dest}", piece.colour(), piece.kind())
            }
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "<null move>");
        }
        write!(
            f,
            "<piece={} dr={} dc={}>",
            self.piece.0, self.delta_row, self.delta_col
        )
    }
}

/// Side effect of an applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialMove {
    #[default]
    None,
    EnPassant,
    Castle,
    /// A pawn reached the last rank and waits for [`Board::promote`].
    PromotionPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub special: SpecialMove,
    /// The opponent is mated. Always `false` while a promotion is pending.
    pub checkmate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// The king of this colour is attacked.
    Attacked(PieceColour),
    NotAttacked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    PromotionPending,
    Checkmate(PieceColour), // Winner
    Stalemate,
}

fn is_knight_jump(dr: i8, dc: i8) -> bool {
    matches!((dr.abs(), dc.abs()), (1, 2) | (2, 1))
}

impl Board {
    /// Whether `from` and `to` share a row or column with nothing strictly between them.
    pub fn is_clear_straight(&self, from: Coord, to: Coord) -> bool {
        if from == to || (from.row() != to.row() && from.col() != to.col()) {
            return false;
        }
        self.is_path_clear(from, to)
    }

    /// Whether `from` and `to` share a diagonal with nothing strictly between them.
    pub fn is_clear_diagonal(&self, from: Coord, to: Coord) -> bool {
        let (dr, dc) = from.delta(to);
        if dr == 0 || dr.abs() != dc.abs() {
            return false;
        }
        self.is_path_clear(from, to)
    }

    fn is_path_clear(&self, from: Coord, to: Coord) -> bool {
        let (dr, dc) = from.delta(to);
        let (step_row, step_col) = (dr.signum(), dc.signum());
        let mut cursor = from.offset(step_row, step_col);
        while let Some(square) = cursor {
            if square == to {
                return true;
            }
            if self.has_piece(square) {
                return false;
            }
            cursor = square.offset(step_row, step_col);
        }
        false
    }

    /// Movement rule of the piece on `origin`, ignoring whose turn it is,
    /// what stands on `dest` and king safety.
    pub fn is_legal_geometric_move(&self, origin: Coord, dest: Coord) -> bool {
        let Some(piece) = self.piece_at(origin) else {
            return false;
        };
        if origin == dest {
            return false;
        }
        let (dr, dc) = origin.delta(dest);

        match piece.kind() {
            PieceKind::Bishop => self.is_clear_diagonal(origin, dest),
            PieceKind::Rook => self.is_clear_straight(origin, dest),
            PieceKind::Queen => {
                self.is_clear_straight(origin, dest) || self.is_clear_diagonal(origin, dest)
            }
            PieceKind::Knight => is_knight_jump(dr, dc),
            PieceKind::King => {
                (dr.abs() <= 1 && dc.abs() <= 1) || self.can_castle_to(piece, origin, dest)
            }
            PieceKind::Pawn => {
                self.is_pawn_advance(piece, origin, dest)
                    || self.can_pawn_capture(piece, origin, dest)
            }
        }
    }

    fn is_pawn_advance(&self, pawn: &Piece, origin: Coord, dest: Coord) -> bool {
        let (dr, dc) = origin.delta(dest);
        let dir = pawn.colour().pawn_direction();
        if dc != 0 || self.has_piece(dest) {
            return false;
        }
        if dr == dir {
            return true;
        }
        dr == 2 * dir
            && origin.row() == pawn.colour().pawn_start_row()
            && origin.offset(dir, 0).is_some_and(|mid| !self.has_piece(mid))
    }

    /// Whether `pawn`, standing on `origin`, may capture on `dest`, en passant included.
    pub fn can_pawn_capture(&self, pawn: &Piece, origin: Coord, dest: Coord) -> bool {
        let (dr, dc) = origin.delta(dest);
        if dr != pawn.colour().pawn_direction() || dc.abs() != 1 {
            return false;
        }
        match self.piece_at(dest) {
            Some(target) => target.colour() != pawn.colour(),
            None => self
                .en_passant_victim(dest)
                .is_some_and(|victim| victim.colour() != pawn.colour()),
        }
    }

    /// The pawn that a capture onto `target` would take en passant.
    pub fn en_passant_victim(&self, target: Coord) -> Option<&Piece> {
        if self.en_passant != Some(target) {
            return None;
        }
        let mover = self.turn.invert();
        let victim = self.piece_at(target.offset(mover.pawn_direction(), 0)?)?;
        (victim.kind() == PieceKind::Pawn && victim.just_double_stepped()).then_some(victim)
    }

    fn can_castle_to(&self, king: &Piece, origin: Coord, dest: Coord) -> bool {
        let (dr, dc) = origin.delta(dest);
        if dr != 0 || dc.abs() != 2 || !king.can_castle() {
            return false;
        }
        let colour = king.colour();
        if origin != Coord::at(colour.back_row(), KING_HOME_COL) {
            return false;
        }

        let rook_home = Coord::at(origin.row(), if dc > 0 { 7 } else { 0 });
        let rook_ready = self.piece_at(rook_home).is_some_and(|rook| {
            rook.kind() == PieceKind::Rook && rook.colour() == colour && rook.can_castle()
        });
        if !rook_ready || !self.is_clear_straight(origin, rook_home) {
            return false;
        }

        // The king may not castle out of or through check
        let enemy = colour.invert();
        !self.is_square_attacked(origin, enemy)
            && origin
                .offset(0, dc.signum())
                .is_some_and(|passed| !self.is_square_attacked(passed, enemy))
    }

    /// Base contract shared by every piece: an occupied origin, a different
    /// destination not held by a friendly piece, the movement rule, and a
    /// king that is not left in check. Turn order is not considered.
    pub fn check_move(&self, origin: Coord, dest: Coord) -> Result<(), IllegalMoveReason> {
        let piece = self.piece_at(origin).ok_or(IllegalMoveReason::NoPiece)?;
        if origin == dest {
            return Err(IllegalMoveReason::SameSquare);
        }
        if self
            .piece_at(dest)
            .is_some_and(|target| target.colour() == piece.colour())
        {
            return Err(IllegalMoveReason::OwnPieceOnDestination);
        }
        if !self.is_legal_geometric_move(origin, dest) {
            return Err(IllegalMoveReason::InvalidGeometry);
        }
        if self.leaves_king_in_check(origin, dest, piece.colour()) {
            return Err(IllegalMoveReason::LeavesKingInCheck);
        }
        Ok(())
    }

    pub fn is_legal_move(&self, origin: Coord, dest: Coord) -> bool {
        self.check_move(origin, dest).is_ok()
    }

    fn leaves_king_in_check(&self, origin: Coord, dest: Coord, colour: PieceColour) -> bool {
        let mut trial = self.deepcopy();
        trial.apply(origin, dest);
        trial.is_king_in_check(colour)
    }

    fn candidate_squares(&self, piece: &Piece, origin: Coord) -> Vec<Coord> {
        let steps = |offsets: &[(i8, i8)]| -> Vec<Coord> {
            offsets
                .iter()
                .filter_map(|&(dr, dc)| origin.offset(dr, dc))
                .collect()
        };

        match piece.kind() {
            PieceKind::Knight => steps(&KNIGHT_OFFSETS),
            PieceKind::King => {
                let mut squares = steps(&KING_OFFSETS);
                squares.extend(steps(&[(0, 2), (0, -2)]));
                squares
            }
            PieceKind::Pawn => {
                let dir = piece.colour().pawn_direction();
                steps(&[(dir, 0), (2 * dir, 0), (dir, -1), (dir, 1)])
            }
            PieceKind::Bishop => self.ray_squares(origin, &DIAGONAL_RAYS),
            PieceKind::Rook => self.ray_squares(origin, &STRAIGHT_RAYS),
            PieceKind::Queen => {
                let mut squares = self.ray_squares(origin, &STRAIGHT_RAYS);
                squares.extend(self.ray_squares(origin, &DIAGONAL_RAYS));
                squares
            }
        }
    }

    /// Squares along each ray up to and including the first occupied one.
    fn ray_squares(&self, origin: Coord, rays: &[(i8, i8)]) -> Vec<Coord> {
        let mut squares = Vec::new();
        for &(dr, dc) in rays {
            let mut cursor = origin.offset(dr, dc);
            while let Some(square) = cursor {
                squares.push(square);
                if self.has_piece(square) {
                    break;
                }
                cursor = square.offset(dr, dc);
            }
        }
        squares
    }

    /// Every fully legal move of the piece on `origin`, whoever's turn it is.
    pub fn legal_moves_from(&self, origin: Coord) -> Vec<Move> {
        let Some(id) = self.piece_id_at(origin) else {
            return Vec::new();
        };
        let piece = &self.pieces[id.0];

        self.candidate_squares(piece, origin)
            .into_iter()
            .filter(|&dest| self.is_legal_move(origin, dest))
            .map(|dest| {
                let (dr, dc) = origin.delta(dest);
                Move::new(id, dr, dc)
            })
            .collect()
    }

    /// Every legal move of the side to move, in roster order.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        for (_, piece) in self.pieces() {
            if piece.colour() == self.turn {
                moves.extend(self.legal_moves_from(piece.position()));
            }
        }
        moves
    }

    pub fn has_legal_moves(&self) -> bool {
        self.pieces()
            .filter(|(_, piece)| piece.colour() == self.turn)
            .any(|(_, piece)| !self.legal_moves_from(piece.position()).is_empty())
    }

    /// Readable list of the legal moves of the side to move.
    pub fn legal_moves_readable(&self) -> Vec<String> {
        self.legal_moves()
            .iter()
            .map(|mv| mv.describe(self))
            .collect()
    }

    /// Whether `piece` attacks `target`. A pawn attacks diagonally only.
    pub fn attacks(&self, piece: &Piece, target: Coord) -> bool {
        let origin = piece.position();
        if origin == target {
            return false;
        }
        let (dr, dc) = origin.delta(target);

        match piece.kind() {
            PieceKind::Bishop => self.is_clear_diagonal(origin, target),
            PieceKind::Rook => self.is_clear_straight(origin, target),
            PieceKind::Queen => {
                self.is_clear_straight(origin, target) || self.is_clear_diagonal(origin, target)
            }
            PieceKind::Knight => is_knight_jump(dr, dc),
            PieceKind::King => dr.abs() <= 1 && dc.abs() <= 1,
            PieceKind::Pawn => dr == piece.colour().pawn_direction() && dc.abs() == 1,
        }
    }

    pub fn is_square_attacked(&self, target: Coord, by: PieceColour) -> bool {
        self.pieces()
            .any(|(_, piece)| piece.colour() == by && self.attacks(piece, target))
    }

    /// A board without a king of `colour` is never in check for that colour.
    pub fn is_king_in_check(&self, colour: PieceColour) -> bool {
        self.king(colour)
            .is_some_and(|king| self.is_square_attacked(king.position(), colour.invert()))
    }

    /// Which king, if any, is attacked. The side that just moved is reported first.
    pub fn is_check(&self) -> Check {
        for colour in [self.turn.invert(), self.turn] {
            if self.is_king_in_check(colour) {
                return Check::Attacked(colour);
            }
        }
        Check::NotAttacked
    }

    /// The side to move is in check with no legal reply. Deferred while a
    /// promotion is pending.
    pub fn is_checkmate(&self) -> bool {
        self.promotion.is_none() && self.is_king_in_check(self.turn) && !self.has_legal_moves()
    }

    pub fn is_stalemate(&self) -> bool {
        self.promotion.is_none() && !self.is_king_in_check(self.turn) && !self.has_legal_moves()
    }

    pub fn game_state(&self) -> GameState {
        if self.promotion.is_some() {
            return GameState::PromotionPending;
        }
        if self.has_legal_moves() {
            GameState::Ongoing
        } else if self.is_king_in_check(self.turn) {
            GameState::Checkmate(self.turn.invert())
        } else {
            GameState::Stalemate
        }
    }

    /// Executes a move without validating it and hands the turn over.
    /// Returns `None` when `origin` is empty.
    pub(crate) fn apply(&mut self, origin: Coord, dest: Coord) -> Option<SpecialMove> {
        let id = self.piece_id_at(origin)?;
        let (kind, colour, can_castle) = {
            let piece = &self.pieces[id.0];
            (piece.kind(), piece.colour(), piece.can_castle())
        };
        let (dr, dc) = origin.delta(dest);

        let previous_target = self.en_passant.take();
        for &other in &self.roster {
            self.pieces[other.0].just_double_stepped = false;
        }

        let mut special = SpecialMove::None;
        match kind {
            PieceKind::Pawn
                if dc != 0 && !self.has_piece(dest) && previous_target == Some(dest) =>
            {
                if let Some(victim) = Coord::new(origin.row(), dest.col()) {
                    self.remove(victim);
                }
                special = SpecialMove::EnPassant;
            }
            PieceKind::King if can_castle && dr == 0 && dc.abs() == 2 => {
                let rook_from = Coord::at(origin.row(), if dc > 0 { 7 } else { 0 });
                if let (Some(rook), Some(rook_to)) =
                    (self.lift(rook_from), origin.offset(0, dc.signum()))
                {
                    self.place(rook, rook_to);
                }
                special = SpecialMove::Castle;
            }
            _ => {}
        }

        if let Some(captured) = self.remove(dest) {
            trace!(captured = captured.0, square = %dest, "capture");
        }
        self.lift(origin);
        self.place(id, dest);

        if kind == PieceKind::Pawn {
            if dr.abs() == 2 {
                self.en_passant = origin.offset(dr.signum(), 0);
                self.pieces[id.0].just_double_stepped = true;
            }
            if dest.row() == colour.promotion_row() {
                self.promotion = Some(dest);
                special = SpecialMove::PromotionPending;
            }
        }

        self.turn = self.turn.invert();
        Some(special)
    }

    /// Applies a move that is assumed legal and evaluates checkmate for the
    /// side now to move.
    pub fn move_piece(
        &mut self,
        origin: Coord,
        dest: Coord,
    ) -> Result<MoveOutcome, IllegalMoveReason> {
        let special = self.apply(origin, dest).ok_or(IllegalMoveReason::NoPiece)?;
        let checkmate = special != SpecialMove::PromotionPending && self.is_checkmate();
        debug!(%origin, %dest, ?special, checkmate, "piece moved");
        Ok(MoveOutcome { special, checkmate })
    }

    pub fn make_move(&mut self, mv: Move) -> Result<MoveOutcome, IllegalMoveReason> {
        let (origin, dest) = mv.endpoints(self).ok_or(IllegalMoveReason::NoPiece)?;
        self.move_piece(origin, dest)
    }

    /// Validates a move for the side to move and applies it. On error the
    /// board is untouched.
    pub fn try_move(&mut self, origin: Coord, dest: Coord) -> ChessResult<MoveOutcome> {
        let reject = |reason| ChessError::illegal(origin, dest, reason);

        if self.promotion.is_some() {
            return Err(reject(IllegalMoveReason::PromotionPending));
        }
        let colour = self
            .piece_at(origin)
            .map(|piece| piece.colour())
            .ok_or_else(|| reject(IllegalMoveReason::NoPiece))?;
        if colour != self.turn {
            return Err(reject(IllegalMoveReason::WrongTurn));
        }
        self.check_move(origin, dest).map_err(reject)?;
        self.move_piece(origin, dest).map_err(reject)
    }

    /// Replaces the pending pawn on `square` with a new piece. Returns whether
    /// the opponent is now checkmated.
    pub fn promote(
        &mut self,
        square: Coord,
        kind: PieceKind,
        colour: PieceColour,
    ) -> ChessResult<bool> {
        if self.promotion != Some(square) {
            return Err(ChessError::PromotionNotPending { square });
        }
        if !kind.is_promotion_target() {
            return Err(ChessError::InvalidPromotion { kind });
        }
        let expected = self
            .piece_at(square)
            .map(|pawn| pawn.colour())
            .ok_or(ChessError::PromotionNotPending { square })?;
        if expected != colour {
            return Err(ChessError::PromotionColourMismatch {
                expected,
                found: colour,
            });
        }

        self.spawn(square, kind, colour);
        self.promotion = None;
        let checkmate = self.is_checkmate();
        debug!(%square, ?kind, checkmate, "pawn promoted");
        Ok(checkmate)
    }

    /// Resolves a pending promotion with a queen, as search play does.
    pub(crate) fn auto_promote(&mut self) {
        if let Some(square) = self.promotion.take() {
            if let Some(colour) = self.piece_at(square).map(|pawn| pawn.colour()) {
                self.spawn(square, PieceKind::Queen, colour);
            }
        }
    }
}
