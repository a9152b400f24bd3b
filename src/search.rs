use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::board::{Board, PieceColour};
use crate::compact::{CompactBoard, CompactMove};
use crate::error::{ChessError, ChessResult};
use crate::evaluation::Evaluator;
use crate::movegen::Move;

/// Score of a mated position, from White's point of view when White mates.
pub const MATE_SCORE: f32 = 1000.0;

pub const DEFAULT_DEPTH: u32 = 4;

/// Board type the search walks below the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Representation {
    Rich,
    #[default]
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Plies searched, the root move included.
    pub depth: u32,
    pub representation: Representation,
    /// Add tie-breaking noise to compact evaluations.
    pub jitter: bool,
    pub seed: Option<u64>,
    pub pruning: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            representation: Representation::Compact,
            jitter: true,
            seed: None,
            pruning: true,
        }
    }
}

impl SearchConfig {
    /// Default settings without evaluation noise.
    pub fn deterministic() -> Self {
        Self {
            jitter: false,
            ..Self::default()
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_pruning(mut self, pruning: bool) -> Self {
        self.pruning = pruning;
        self
    }
}

/// Position the game tree can be walked on.
pub trait SearchBoard: Clone {
    type Move: Copy;

    fn side_to_move(&self) -> PieceColour;

    fn generate_moves(&self) -> Vec<Self::Move>;

    /// Plays a legal move, promoting pawns to queens.
    fn play(&mut self, mv: Self::Move);

    fn in_check(&self) -> bool;

    fn static_eval(&self, evaluator: &mut Evaluator) -> f32;
}

impl SearchBoard for Board {
    type Move = Move;

    fn side_to_move(&self) -> PieceColour {
        self.turn()
    }

    fn generate_moves(&self) -> Vec<Move> {
        self.legal_moves()
    }

    fn play(&mut self, mv: Move) {
        if let Some((origin, dest)) = mv.endpoints(self) {
            self.apply(origin, dest);
            self.auto_promote();
        }
    }

    fn in_check(&self) -> bool {
        self.is_king_in_check(self.turn())
    }

    fn static_eval(&self, evaluator: &mut Evaluator) -> f32 {
        evaluator.evaluate(self)
    }
}

impl SearchBoard for CompactBoard {
    type Move = CompactMove;

    fn side_to_move(&self) -> PieceColour {
        self.turn()
    }

    fn generate_moves(&self) -> Vec<CompactMove> {
        self.legal_moves()
    }

    fn play(&mut self, mv: CompactMove) {
        self.make_move(mv);
    }

    fn in_check(&self) -> bool {
        self.is_king_in_check(self.turn())
    }

    fn static_eval(&self, evaluator: &mut Evaluator) -> f32 {
        evaluator.evaluate_compact(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub best_move: Move,
    pub score: f32,
    pub nodes: u64,
}

/// Score of a node whose side to move has no legal move.
fn terminal_score(in_check: bool, maximizing: bool) -> f32 {
    match (in_check, maximizing) {
        (false, _) => 0.0,
        (true, true) => -MATE_SCORE,
        (true, false) => MATE_SCORE,
    }
}

#[derive(Debug)]
pub struct Search {
    config: SearchConfig,
    evaluator: Evaluator,
    nodes_searched: u64,
    cancel: Arc<AtomicBool>,
}

impl Default for Search {
    fn default() -> Self {
        Search::new(SearchConfig::default())
    }
}

impl Search {
    pub fn new(config: SearchConfig) -> Self {
        let evaluator = if config.jitter {
            Evaluator::with_jitter(config.seed)
        } else {
            Evaluator::new()
        };
        Self {
            config,
            evaluator,
            nodes_searched: 0,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn set_max_depth(&mut self, depth: u32) {
        self.config.depth = depth;
    }

    pub fn get_nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    /// Flag that stops the search at its next node once set.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Picks a move for the side to move on `board`. Each root move is scored
    /// with a full window; among equal scores the last one wins.
    pub fn find_best_move(&mut self, board: &Board) -> ChessResult<SearchResult> {
        self.nodes_searched = 0;
        let colour = board.turn();
        let maximizing = colour == PieceColour::White;
        let depth = self.config.depth.max(1);
        info!(?colour, depth, representation = ?self.config.representation, "search started");

        let mut best: Option<(Move, f32)> = None;
        for mv in board.legal_moves() {
            let mut daughter = board.deepcopy();
            SearchBoard::play(&mut daughter, mv);

            let score = match self.config.representation {
                Representation::Rich => {
                    self.minimax(&daughter, depth - 1, f32::NEG_INFINITY, f32::INFINITY)?
                }
                Representation::Compact => self.minimax(
                    &CompactBoard::from(&daughter),
                    depth - 1,
                    f32::NEG_INFINITY,
                    f32::INFINITY,
                )?,
            };
            debug!(candidate = %mv.describe(board), score, "root move scored");

            let better = match best {
                None => true,
                Some((_, best_score)) if maximizing => score >= best_score,
                Some((_, best_score)) => score <= best_score,
            };
            if better {
                best = Some((mv, score));
            }
        }

        let (best_move, score) = best.ok_or(ChessError::NoComputerMoveAvailable)?;
        info!(
            nodes = self.nodes_searched,
            evaluation = score,
            best = %best_move.describe(board),
            "search finished"
        );
        Ok(SearchResult {
            best_move,
            score,
            nodes: self.nodes_searched,
        })
    }

    /// Minimax value of `board` searched `depth` plies deep. White maximizes.
    pub fn minimax<B: SearchBoard>(
        &mut self,
        board: &B,
        depth: u32,
        mut alpha: f32,
        mut beta: f32,
    ) -> ChessResult<f32> {
        self.nodes_searched += 1;
        if self.cancel.load(Ordering::Relaxed) {
            return Err(ChessError::SearchCancelled);
        }

        if depth == 0 {
            return Ok(board.static_eval(&mut self.evaluator));
        }

        let maximizing = board.side_to_move() == PieceColour::White;
        let moves = board.generate_moves();
        if moves.is_empty() {
            return Ok(terminal_score(board.in_check(), maximizing));
        }

        if maximizing {
            let mut evaluation = f32::NEG_INFINITY;
            for mv in moves {
                let mut daughter = board.clone();
                daughter.play(mv);
                evaluation = evaluation.max(self.minimax(&daughter, depth - 1, alpha, beta)?);
                alpha = alpha.max(evaluation);
                if self.config.pruning && alpha >= beta {
                    break;
                }
            }
            Ok(evaluation)
        } else {
            let mut evaluation = f32::INFINITY;
            for mv in moves {
                let mut daughter = board.clone();
                daughter.play(mv);
                evaluation = evaluation.min(self.minimax(&daughter, depth - 1, alpha, beta)?);
                beta = beta.min(evaluation);
                if self.config.pruning && alpha >= beta {
                    break;
                }
            }
            Ok(evaluation)
        }
    }
}
