//! Game-level API for an interactive front end.
//!
//! The driver owns the live [`Board`], validates human moves, resolves
//! promotions and runs the computer player's search in the background.

use tracing::{debug, info, warn};

use crate::board::{Board, Coord, PieceColour, PieceKind, Snapshot};
use crate::error::{ChessError, ChessResult, IllegalMoveReason};
use crate::movegen::{GameState, Move, MoveOutcome, SpecialMove};
use crate::search::{Search, SearchConfig};
use crate::worker::SearchTask;

/// What an applied move did.
pub type MoveReport = MoveOutcome;

#[derive(Debug, Clone)]
struct ComputerPlayer {
    colour: PieceColour,
    config: SearchConfig,
}

#[derive(Debug)]
pub struct ChessDriver {
    board: Board,
    special: SpecialMove,
    /// Square of the last promotion that was resolved.
    resolved: Option<Coord>,
    computer: Option<ComputerPlayer>,
    pending: Option<SearchTask>,
}

impl Default for ChessDriver {
    fn default() -> Self {
        ChessDriver::new()
    }
}

impl ChessDriver {
    /// Two human players from the standard position.
    pub fn new() -> Self {
        ChessDriver::from_board(Board::new())
    }

    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            special: SpecialMove::None,
            resolved: None,
            computer: None,
            pending: None,
        }
    }

    /// Lets the computer play `colour` with the given search settings.
    pub fn with_computer(mut self, colour: PieceColour, config: SearchConfig) -> Self {
        self.computer = Some(ComputerPlayer { colour, config });
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> PieceColour {
        self.board.turn()
    }

    pub fn is_computer_game(&self) -> bool {
        self.computer.is_some()
    }

    pub fn computer_colour(&self) -> Option<PieceColour> {
        self.computer.as_ref().map(|computer| computer.colour)
    }

    /// Side effect of the last applied move.
    pub fn special_situation(&self) -> SpecialMove {
        self.special
    }

    pub fn promoting_square(&self) -> Option<Coord> {
        self.board.pending_promotion()
    }

    pub fn status(&self) -> GameState {
        self.board.game_state()
    }

    /// Only checkmate ends the game; stalemate is reported through [`ChessDriver::status`].
    pub fn is_game_over(&self) -> bool {
        matches!(self.status(), GameState::Checkmate(_))
    }

    pub fn winner(&self) -> Option<PieceColour> {
        match self.status() {
            GameState::Checkmate(winner) => Some(winner),
            _ => None,
        }
    }

    /// Legal moves of the piece on `square`. Does not change any state.
    pub fn legal_move_set(&self, square: Coord) -> Vec<Move> {
        self.board.legal_moves_from(square)
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.board.legal_moves()
    }

    pub fn position_snapshot(&self) -> Snapshot {
        self.board.snapshot()
    }

    /// Validates and plays a move for the side to move. An error means the
    /// move was not applied.
    pub fn attempt_move(&mut self, origin: Coord, dest: Coord) -> ChessResult<MoveReport> {
        if self.pending.is_some() {
            return Err(ChessError::illegal(
                origin,
                dest,
                IllegalMoveReason::SearchInProgress,
            ));
        }

        let report = self.board.try_move(origin, dest).map_err(|err| {
            warn!(%origin, %dest, error = %err, "move rejected");
            err
        })?;
        self.special = report.special;
        if report.checkmate {
            info!(winner = ?self.board.turn().invert(), "checkmate");
        }
        Ok(report)
    }

    /// Replaces the pending pawn on `square`. Returns whether the opponent is
    /// now checkmated.
    pub fn resolve_promotion(
        &mut self,
        square: Coord,
        kind: PieceKind,
        colour: PieceColour,
    ) -> ChessResult<bool> {
        if self.board.pending_promotion().is_none() && self.resolved == Some(square) {
            return Err(ChessError::PromotionAlreadyResolved { square });
        }
        let checkmate = self.board.promote(square, kind, colour)?;
        self.resolved = Some(square);
        Ok(checkmate)
    }

    /// Starts the computer's search for `colour` in the background.
    pub fn request_computer_move(&mut self, colour: PieceColour) -> ChessResult<()> {
        let config = self
            .computer
            .as_ref()
            .filter(|computer| computer.colour == colour)
            .map(|computer| computer.config.clone())
            .ok_or(ChessError::NoComputerPlayer(colour))?;
        if self.pending.is_some() {
            return Err(ChessError::SearchInProgress);
        }
        if let Some(square) = self.board.pending_promotion() {
            return Err(ChessError::PromotionUnresolved { square });
        }
        if self.board.turn() != colour {
            return Err(ChessError::NotComputersTurn(colour));
        }

        let task = SearchTask::spawn(self.board.deepcopy(), Search::new(config))?;
        self.pending = Some(task);
        debug!(?colour, "computer move requested");
        Ok(())
    }

    /// Whether a requested search has finished. Never blocks.
    pub fn computer_move_ready(&self) -> bool {
        self.pending.as_ref().is_some_and(SearchTask::is_finished)
    }

    /// Waits for the requested search and returns its move without playing it.
    pub fn await_computer_move(&mut self) -> ChessResult<Move> {
        let task = self.pending.take().ok_or(ChessError::NoSearchPending)?;
        Ok(task.join()?.best_move)
    }

    /// Abandons the requested search.
    pub fn cancel_computer_move(&mut self) -> ChessResult<()> {
        let task = self.pending.take().ok_or(ChessError::NoSearchPending)?;
        task.cancel();
        match task.join() {
            Ok(_) | Err(ChessError::SearchCancelled) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Waits for the requested search and plays its move. A computer pawn
    /// reaching the last rank becomes a queen.
    pub fn play_computer_move(&mut self) -> ChessResult<MoveReport> {
        let mv = self.await_computer_move()?;
        let (origin, dest) = mv
            .endpoints(&self.board)
            .ok_or(ChessError::NoComputerMoveAvailable)?;
        let colour = self.board.turn();

        let mut report = self.attempt_move(origin, dest)?;
        if report.special == SpecialMove::PromotionPending {
            report.checkmate = self.resolve_promotion(dest, PieceKind::Queen, colour)?;
        }
        info!(computer = ?colour, %origin, %dest, "computer moved");
        Ok(report)
    }
}
