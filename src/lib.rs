//! A chess rules engine with a fixed-depth alpha-beta search.
//!
//! [`Board`] is the canonical game state and enforces the full rules.
//! [`CompactBoard`] is a copy-able byte grid the search walks instead.
//! [`ChessDriver`] ties both to a computer player running in the background.

pub mod board;
pub mod compact;
pub mod driver;
pub mod error;
pub mod evaluation;
pub mod movegen;
pub mod search;
pub mod worker;

pub use board::{Board, Coord, Layout, Piece, PieceColour, PieceId, PieceKind, Snapshot, Square};
pub use compact::{CompactBoard, CompactMove};
pub use driver::{ChessDriver, MoveReport};
pub use error::{ChessError, ChessResult, IllegalMoveReason};
pub use evaluation::Evaluator;
pub use movegen::{Check, GameState, Move, MoveOutcome, SpecialMove};
pub use search::{Representation, Search, SearchBoard, SearchConfig, SearchResult, MATE_SCORE};
pub use worker::SearchTask;
