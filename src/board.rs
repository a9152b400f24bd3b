use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ChessError, ChessResult};

/// Column the king starts on, for both colours.
pub const KING_HOME_COL: u8 = 4;

/// Grid of piece kinds and colours, as handed to a renderer.
pub type Snapshot = [[Option<(PieceKind, PieceColour)>; 8]; 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Lowercase letter for this kind (`p n b r q k`).
    pub const fn letter(self) -> u8 {
        match self {
            PieceKind::Pawn => b'p',
            PieceKind::Knight => b'n',
            PieceKind::Bishop => b'b',
            PieceKind::Rook => b'r',
            PieceKind::Queen => b'q',
            PieceKind::King => b'k',
        }
    }

    /// Parses a piece letter of either case.
    pub fn from_letter(letter: u8) -> Option<PieceKind> {
        match letter.to_ascii_lowercase() {
            b'p' => Some(PieceKind::Pawn),
            b'n' => Some(PieceKind::Knight),
            b'b' => Some(PieceKind::Bishop),
            b'r' => Some(PieceKind::Rook),
            b'q' => Some(PieceKind::Queen),
            b'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Whether a pawn may be replaced by this kind on promotion.
    pub const fn is_promotion_target(self) -> bool {
        matches!(
            self,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceColour {
    White,
    Black,
}

impl PieceColour {
    pub const fn invert(self) -> PieceColour {
        match self {
            PieceColour::White => PieceColour::Black,
            PieceColour::Black => PieceColour::White,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Row increment of a pawn advance.
    #[inline]
    pub const fn pawn_direction(self) -> i8 {
        match self {
            PieceColour::White => 1,
            PieceColour::Black => -1,
        }
    }

    #[inline]
    pub const fn pawn_start_row(self) -> u8 {
        match self {
            PieceColour::White => 1,
            PieceColour::Black => 6,
        }
    }

    #[inline]
    pub const fn promotion_row(self) -> u8 {
        match self {
            PieceColour::White => 7,
            PieceColour::Black => 0,
        }
    }

    #[inline]
    pub const fn back_row(self) -> u8 {
        match self {
            PieceColour::White => 0,
            PieceColour::Black => 7,
        }
    }

    /// Board symbol of a piece: lowercase for White, uppercase for Black.
    pub const fn symbol(self, kind: PieceKind) -> u8 {
        match self {
            PieceColour::White => kind.letter(),
            PieceColour::Black => kind.letter().to_ascii_uppercase(),
        }
    }

    /// Colour encoded by a board symbol, `None` for an empty square.
    pub fn of_symbol(symbol: u8) -> Option<PieceColour> {
        if symbol.is_ascii_lowercase() {
            Some(PieceColour::White)
        } else if symbol.is_ascii_uppercase() {
            Some(PieceColour::Black)
        } else {
            None
        }
    }
}

/// A square coordinate. Row 0 is White's back rank, column 0 is the a-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    pub const fn new(row: u8, col: u8) -> Option<Coord> {
        if row < 8 && col < 8 {
            Some(Coord { row, col })
        } else {
            None
        }
    }

    /// Caller guarantees both indices are below 8.
    #[inline]
    pub(crate) const fn at(row: u8, col: u8) -> Coord {
        Coord { row, col }
    }

    #[inline]
    pub const fn row(self) -> u8 {
        self.row
    }

    #[inline]
    pub const fn col(self) -> u8 {
        self.col
    }

    /// The square `(dr, dc)` away, if it is still on the board.
    pub fn offset(self, dr: i8, dc: i8) -> Option<Coord> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Coord::at(row as u8, col as u8))
        } else {
            None
        }
    }

    /// Displacement from `self` to `other`.
    pub fn delta(self, other: Coord) -> (i8, i8) {
        (
            other.row as i8 - self.row as i8,
            other.col as i8 - self.col as i8,
        )
    }

    /// All 64 squares, row by row from a1.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..8).flat_map(|row| (0..8).map(move |col| Coord::at(row, col)))
    }

    /// Parse a square from algebraic notation (e.g., "e4")
    pub fn from_algebraic(s: &str) -> Option<Coord> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let col = bytes[0].wrapping_sub(b'a');
        let row = bytes[1].wrapping_sub(b'1');
        Coord::new(row, col)
    }
}

impl FromStr for Coord {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Coord::from_algebraic(s).ok_or_else(|| ChessError::InvalidSquare(s.to_string()))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, self.row + 1)
    }
}

/// Handle to a piece in a board's arena.
///
/// Ids survive [`Board::deepcopy`], so a handle taken on a copy addresses the
/// same piece on the board it was copied from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    colour: PieceColour,
    position: Coord,
    pub(crate) can_castle: bool,
    pub(crate) just_double_stepped: bool,
}

impl Piece {
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn colour(&self) -> PieceColour {
        self.colour
    }

    pub fn position(&self) -> Coord {
        self.position
    }

    /// Kings and rooks only: the piece has not moved since set-up.
    pub fn can_castle(&self) -> bool {
        self.can_castle
    }

    /// Pawns only: the pawn's last move was a double step made on the previous ply.
    pub fn just_double_stepped(&self) -> bool {
        self.just_double_stepped
    }

    pub fn symbol(&self) -> char {
        self.colour.symbol(self.kind) as char
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Square {
    coord: Coord,
    occupant: Option<PieceId>,
}

impl Square {
    pub fn coord(&self) -> Coord {
        self.coord
    }

    pub fn occupant(&self) -> Option<PieceId> {
        self.occupant
    }

    pub fn has_piece(&self) -> bool {
        self.occupant.is_some()
    }
}

/// Named starting positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    Empty,
    #[default]
    Standard,
    /// White pawn on d2, white king on e2, black king on g2.
    Promotion,
    /// Up to ten non-pawn pieces scattered with alternating colours.
    Random { seed: u64 },
}

/// The live game state.
///
/// Pieces are stored in an arena and addressed by [`PieceId`]. The roster
/// lists the ids still on the board in creation order; captured pieces stay
/// in the arena but leave the roster and the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub(crate) squares: [[Square; 8]; 8],
    pub(crate) pieces: Vec<Piece>,
    pub(crate) roster: Vec<PieceId>,
    pub(crate) kings: [Option<PieceId>; 2],
    pub(crate) en_passant: Option<Coord>,
    pub(crate) turn: PieceColour,
    pub(crate) promotion: Option<Coord>,
}

const BACK_RANK: [(u8, PieceKind); 8] = [
    (0, PieceKind::Rook),
    (7, PieceKind::Rook),
    (1, PieceKind::Knight),
    (6, PieceKind::Knight),
    (2, PieceKind::Bishop),
    (5, PieceKind::Bishop),
    (3, PieceKind::Queen),
    (4, PieceKind::King),
];

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl Board {
    /// The standard opening position, White to move.
    pub fn new() -> Self {
        Board::with_layout(Layout::Standard)
    }

    pub fn empty() -> Self {
        Self {
            squares: std::array::from_fn(|row| {
                std::array::from_fn(|col| Square {
                    coord: Coord::at(row as u8, col as u8),
                    occupant: None,
                })
            }),
            pieces: Vec::with_capacity(32),
            roster: Vec::with_capacity(32),
            kings: [None, None],
            en_passant: None,
            turn: PieceColour::White,
            promotion: None,
        }
    }

    pub fn with_layout(layout: Layout) -> Self {
        let mut board = Board::empty();
        match layout {
            Layout::Empty => {}
            Layout::Standard => board.init_standard(),
            Layout::Promotion => board.init_promotion(),
            Layout::Random { seed } => board.init_random(seed),
        }
        board
    }

    fn init_standard(&mut self) {
        for colour in [PieceColour::White, PieceColour::Black] {
            let row = colour.back_row();
            for (col, kind) in BACK_RANK {
                self.spawn(Coord::at(row, col), kind, colour);
            }
        }
        for col in 0..8 {
            self.spawn(Coord::at(1, col), PieceKind::Pawn, PieceColour::White);
            self.spawn(Coord::at(6, col), PieceKind::Pawn, PieceColour::Black);
        }

        for piece in self.pieces.iter_mut() {
            if matches!(piece.kind, PieceKind::King | PieceKind::Rook) {
                piece.can_castle = true;
            }
        }
    }

    fn init_promotion(&mut self) {
        self.spawn(Coord::at(1, 3), PieceKind::Pawn, PieceColour::White);
        self.spawn(Coord::at(1, 4), PieceKind::King, PieceColour::White);
        self.spawn(Coord::at(1, 6), PieceKind::King, PieceColour::Black);
    }

    fn init_random(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        for k in 0..10 {
            let coord = loop {
                let coord = Coord::at(rng.gen_range(0..8), rng.gen_range(0..8));
                if !self.has_piece(coord) {
                    break coord;
                }
            };
            let colour = if k % 2 == 0 {
                PieceColour::White
            } else {
                PieceColour::Black
            };
            let kind = match rng.gen_range(0..5) {
                1 => PieceKind::Bishop,
                2 => PieceKind::Knight,
                3 => PieceKind::Rook,
                4 => PieceKind::Queen,
                _ => continue,
            };
            self.spawn(coord, kind, colour);
        }
    }

    /// Creates a piece on `coord`, replacing whatever stood there.
    ///
    /// The new piece has no castling rights; see [`Board::grant_castling`].
    pub fn spawn(&mut self, coord: Coord, kind: PieceKind, colour: PieceColour) -> PieceId {
        self.remove(coord);

        let id = PieceId(self.pieces.len());
        self.pieces.push(Piece {
            kind,
            colour,
            position: coord,
            can_castle: false,
            just_double_stepped: false,
        });
        self.roster.push(id);
        self.square_mut(coord).occupant = Some(id);
        if kind == PieceKind::King {
            self.kings[colour.index()] = Some(id);
        }
        id
    }

    /// Takes the piece on `coord` off the board entirely.
    pub fn remove(&mut self, coord: Coord) -> Option<PieceId> {
        let id = self.square_mut(coord).occupant.take()?;
        self.roster.retain(|&other| other != id);
        let colour = self.pieces[id.0].colour;
        if self.kings[colour.index()] == Some(id) {
            self.kings[colour.index()] = None;
        }
        Some(id)
    }

    /// Empties `coord` without touching the roster, for a piece about to be re-placed.
    pub(crate) fn lift(&mut self, coord: Coord) -> Option<PieceId> {
        self.square_mut(coord).occupant.take()
    }

    /// Puts a lifted piece on an empty square. This is a coordinate update,
    /// so it permanently clears the piece's castling right.
    pub(crate) fn place(&mut self, id: PieceId, coord: Coord) {
        self.square_mut(coord).occupant = Some(id);
        let piece = &mut self.pieces[id.0];
        piece.position = coord;
        piece.can_castle = false;
    }

    /// Restores the castling right of an unmoved king and the rook on the
    /// given side. Returns `false` if either is missing from its home square.
    pub fn grant_castling(&mut self, colour: PieceColour, king_side: bool) -> bool {
        let row = colour.back_row();
        let king_home = Coord::at(row, KING_HOME_COL);
        let rook_home = Coord::at(row, if king_side { 7 } else { 0 });
        let (Some(king), Some(rook)) = (self.piece_id_at(king_home), self.piece_id_at(rook_home))
        else {
            return false;
        };
        let king_ok = self.pieces[king.0].kind == PieceKind::King && self.pieces[king.0].colour == colour;
        let rook_ok = self.pieces[rook.0].kind == PieceKind::Rook && self.pieces[rook.0].colour == colour;
        if !king_ok || !rook_ok {
            return false;
        }
        self.pieces[king.0].can_castle = true;
        self.pieces[rook.0].can_castle = true;
        true
    }

    /// Whether the king of `colour` is unmoved on its home square.
    pub fn king_can_castle(&self, colour: PieceColour) -> bool {
        self.piece_at(Coord::at(colour.back_row(), KING_HOME_COL))
            .is_some_and(|p| p.kind == PieceKind::King && p.colour == colour && p.can_castle)
    }

    /// Whether the rook on the given side is unmoved on its home square.
    pub fn rook_can_castle(&self, colour: PieceColour, king_side: bool) -> bool {
        let corner = Coord::at(colour.back_row(), if king_side { 7 } else { 0 });
        self.piece_at(corner)
            .is_some_and(|p| p.kind == PieceKind::Rook && p.colour == colour && p.can_castle)
    }

    /// Castling right in the FEN sense: neither the king nor that rook has moved.
    pub fn castling_right(&self, colour: PieceColour, king_side: bool) -> bool {
        self.king_can_castle(colour) && self.rook_can_castle(colour, king_side)
    }

    fn square_mut(&mut self, coord: Coord) -> &mut Square {
        &mut self.squares[coord.row as usize][coord.col as usize]
    }

    pub fn square(&self, coord: Coord) -> &Square {
        &self.squares[coord.row as usize][coord.col as usize]
    }

    pub fn has_piece(&self, coord: Coord) -> bool {
        self.square(coord).has_piece()
    }

    pub fn piece_id_at(&self, coord: Coord) -> Option<PieceId> {
        self.square(coord).occupant
    }

    pub fn piece_at(&self, coord: Coord) -> Option<&Piece> {
        self.piece_id_at(coord).map(|id| &self.pieces[id.0])
    }

    /// Looks up a piece by id, including captured ones.
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id.0)
    }

    /// Current square of a piece that is still on the board.
    pub fn position_of(&self, id: PieceId) -> Option<Coord> {
        let piece = self.pieces.get(id.0)?;
        (self.piece_id_at(piece.position) == Some(id)).then_some(piece.position)
    }

    /// Live pieces in creation order.
    pub fn pieces(&self) -> impl Iterator<Item = (PieceId, &Piece)> + '_ {
        self.roster.iter().map(move |&id| (id, &self.pieces[id.0]))
    }

    pub fn roster(&self) -> &[PieceId] {
        &self.roster
    }

    pub fn king(&self, colour: PieceColour) -> Option<&Piece> {
        self.kings[colour.index()].map(|id| &self.pieces[id.0])
    }

    pub fn turn(&self) -> PieceColour {
        self.turn
    }

    pub fn set_turn(&mut self, colour: PieceColour) {
        self.turn = colour;
    }

    /// Square skipped by a pawn's double step on the previous ply.
    pub fn en_passant_target(&self) -> Option<Coord> {
        self.en_passant
    }

    /// Square of a pawn waiting to be promoted.
    pub fn pending_promotion(&self) -> Option<Coord> {
        self.promotion
    }

    /// Fully independent copy used for speculative moves.
    pub fn deepcopy(&self) -> Board {
        self.clone()
    }

    /// Board as symbols: lowercase White, uppercase Black, space for empty.
    pub fn to_matrix(&self) -> [[u8; 8]; 8] {
        let mut matrix = [[b' '; 8]; 8];
        for (_, piece) in self.pieces() {
            let Coord { row, col } = piece.position;
            matrix[row as usize][col as usize] = piece.colour.symbol(piece.kind);
        }
        matrix
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot: Snapshot = [[None; 8]; 8];
        for (_, piece) in self.pieces() {
            let Coord { row, col } = piece.position;
            snapshot[row as usize][col as usize] = Some((piece.kind, piece.colour));
        }
        snapshot
    }

    /// Reads piece placement, side to move, castling rights and the
    /// en-passant target. Move counters are accepted and ignored.
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        let invalid = |reason: &str| ChessError::InvalidFen {
            fen: fen.to_string(),
            reason: reason.to_string(),
        };

        let mut fields = fen.split_whitespace();
        let placement = fields
            .next()
            .ok_or_else(|| invalid("missing piece placement"))?;
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid("expected 8 ranks"));
        }

        let mut board = Board::empty();
        for (i, rank) in ranks.iter().enumerate() {
            let row = 7 - i as u8;
            let mut col = 0u8;
            for letter in rank.bytes() {
                if (b'1'..=b'8').contains(&letter) {
                    col = col
                        .checked_add(letter - b'0')
                        .filter(|&c| c <= 8)
                        .ok_or_else(|| invalid("rank is too long"))?;
                    continue;
                }
                let kind =
                    PieceKind::from_letter(letter).ok_or_else(|| invalid("unknown piece letter"))?;
                let colour = if letter.is_ascii_uppercase() {
                    PieceColour::White
                } else {
                    PieceColour::Black
                };
                let coord = Coord::new(row, col).ok_or_else(|| invalid("rank is too long"))?;
                board.spawn(coord, kind, colour);
                col += 1;
            }
            if col != 8 {
                return Err(invalid("rank does not cover 8 files"));
            }
        }

        board.turn = match fields.next() {
            None | Some("w") => PieceColour::White,
            Some("b") => PieceColour::Black,
            Some(_) => return Err(invalid("side to move must be 'w' or 'b'")),
        };

        if let Some(castling) = fields.next() {
            for right in castling.chars() {
                let granted = match right {
                    '-' => true,
                    'K' => board.grant_castling(PieceColour::White, true),
                    'Q' => board.grant_castling(PieceColour::White, false),
                    'k' => board.grant_castling(PieceColour::Black, true),
                    'q' => board.grant_castling(PieceColour::Black, false),
                    _ => return Err(invalid("unknown castling flag")),
                };
                if !granted {
                    return Err(invalid("castling right without king and rook at home"));
                }
            }
        }

        match fields.next() {
            None | Some("-") => {}
            Some(square) => {
                let target = Coord::from_algebraic(square)
                    .ok_or_else(|| invalid("bad en-passant square"))?;
                let mover = board.turn.invert();
                let victim = target
                    .offset(mover.pawn_direction(), 0)
                    .and_then(|c| board.piece_id_at(c))
                    .filter(|&id| {
                        let piece = &board.pieces[id.0];
                        piece.kind == PieceKind::Pawn && piece.colour == mover
                    })
                    .ok_or_else(|| invalid("no pawn behind the en-passant square"))?;
                board.pieces[victim.0].just_double_stepped = true;
                board.en_passant = Some(target);
            }
        }

        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for row in (0..8).rev() {
            let mut empty = 0;
            for col in 0..8 {
                match self.piece_at(Coord::at(row, col)) {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        let letter = match piece.colour {
                            PieceColour::White => piece.kind.letter().to_ascii_uppercase(),
                            PieceColour::Black => piece.kind.letter(),
                        };
                        fen.push(letter as char);
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if row > 0 {
                fen.push('/');
            }
        }

        fen.push_str(match self.turn {
            PieceColour::White => " w ",
            PieceColour::Black => " b ",
        });

        let rights: String = [
            (PieceColour::White, true, 'K'),
            (PieceColour::White, false, 'Q'),
            (PieceColour::Black, true, 'k'),
            (PieceColour::Black, false, 'q'),
        ]
        .into_iter()
        .filter(|&(colour, king_side, _)| self.castling_right(colour, king_side))
        .map(|(_, _, flag)| flag)
        .collect();
        fen.push_str(if rights.is_empty() { "-" } else { &rights });

        match self.en_passant {
            Some(target) => fen.push_str(&format!(" {target}")),
            None => fen.push_str(" -"),
        }
        fen.push_str(" 0 1");
        fen
    }
}

/// Draws an 8x8 grid with rank and file labels, White's back rank at the bottom.
pub(crate) fn write_grid(
    f: &mut fmt::Formatter<'_>,
    symbol_at: impl Fn(Coord) -> u8,
) -> fmt::Result {
    writeln!(f, "   a b c d e f g h")?;
    writeln!(f, "  -----------------")?;
    for row in (0..8).rev() {
        write!(f, "{} ", row + 1)?;
        for col in 0..8 {
            write!(f, "|{}", symbol_at(Coord::at(row, col)) as char)?;
        }
        writeln!(f, "| {}", row + 1)?;
    }
    writeln!(f, "  -----------------")?;
    write!(f, "   a b c d e f g h")
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let matrix = self.to_matrix();
        write_grid(f, |c| matrix[c.row as usize][c.col as usize])
    }
}
