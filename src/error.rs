//! Error types for the rules engine, the search and the driver.
//!
//! Every failure is per-request: the board is left exactly as it was before
//! the failing call.

use std::io;

use thiserror::Error;

use crate::board::{Coord, PieceColour, PieceKind};

/// Why a requested move was not applied.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalMoveReason {
    #[error("there is no piece on the origin square")]
    NoPiece,

    #[error("origin and destination are the same square")]
    SameSquare,

    #[error("the destination holds a piece of the same colour")]
    OwnPieceOnDestination,

    #[error("it is not this piece's turn to move")]
    WrongTurn,

    #[error("the piece cannot move that way")]
    InvalidGeometry,

    #[error("the move would leave the king in check")]
    LeavesKingInCheck,

    #[error("a promotion must be resolved first")]
    PromotionPending,

    #[error("a computer search is still running")]
    SearchInProgress,
}

/// Errors surfaced by the public API.
#[derive(Error, Debug)]
pub enum ChessError {
    /// A move request was rejected, the position is unchanged
    #[error("illegal move {from}-{to}: {reason}")]
    IllegalMove {
        from: Coord,
        to: Coord,
        reason: IllegalMoveReason,
    },

    #[error("invalid square: {0:?}")]
    InvalidSquare(String),

    #[error("invalid FEN {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("no promotion is pending on {square}")]
    PromotionNotPending { square: Coord },

    #[error("the promotion on {square} was already resolved")]
    PromotionAlreadyResolved { square: Coord },

    #[error("the promotion on {square} must be resolved first")]
    PromotionUnresolved { square: Coord },

    #[error("a pawn cannot promote to a {kind:?}")]
    InvalidPromotion { kind: PieceKind },

    #[error("promoting pawn is {expected:?}, requested piece is {found:?}")]
    PromotionColourMismatch {
        expected: PieceColour,
        found: PieceColour,
    },

    #[error("no computer player is configured for {0:?}")]
    NoComputerPlayer(PieceColour),

    #[error("it is not {0:?}'s turn to move")]
    NotComputersTurn(PieceColour),

    #[error("a computer search is already running")]
    SearchInProgress,

    #[error("no computer search has been requested")]
    NoSearchPending,

    #[error("the computer has no legal move")]
    NoComputerMoveAvailable,

    #[error("the search was cancelled")]
    SearchCancelled,

    #[error("the search thread panicked")]
    SearchPanicked,

    #[error("failed to spawn the search thread: {0}")]
    ThreadSpawn(#[from] io::Error),
}

impl ChessError {
    pub(crate) fn illegal(from: Coord, to: Coord, reason: IllegalMoveReason) -> Self {
        ChessError::IllegalMove { from, to, reason }
    }
}

/// Result type alias for chess operations
pub type ChessResult<T> = Result<T, ChessError>;
