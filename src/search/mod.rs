//! Iterative deepening search driving [`minimax`] over a [`Game`].
//!
//! A [`Searcher`] is created once and invoked at every decision point: it
//! keeps its [`TranspositionTable`] between calls, so results of the previous
//! turn speed up the next one.
//!
//! Every iteration searches all root moves one ply deeper than the last. The
//! root moves are re-sorted after each completed iteration and the next one
//! searches them in that order. When the deadline interrupts an iteration, its
//! partial results are discarded and the answer comes from the last completed
//! one. The first iteration only evaluates the children of the root and is
//! never interrupted, so there is always an answer.

pub mod minimax;
pub mod root;
pub mod time;
pub mod transposition;

use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::evaluation::{Evaluator, Score};
use crate::game::{Game, MoveList, Outcome};
use crate::search::minimax::Context;
use crate::search::root::RootMoves;
use crate::search::time::{Deadline, Timer};
use crate::search::transposition::TranspositionTable;

/// Remaining search depth in plies.
pub type Depth = u8;

/// Distance from the root in plies.
pub type Ply = u8;

/// Deepest iteration a search can be asked for.
pub const MAX_DEPTH: Depth = 64;

/// Hard bound on the recursion: nodes this far from the root are evaluated
/// statically.
pub const MAX_PLY: Ply = 128;

/// Why the search returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// All requested iterations completed.
    DepthLimitReached,
    /// The deadline expired.
    TimedOut,
    /// The game is decided: the best move wins, every move loses, or the game
    /// is already over.
    TerminalFound,
}

/// Answer of a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult<A> {
    /// Best move of the last completed iteration, `None` if the game is over.
    pub best_move: Option<A>,
    /// Score of the best move for the player to move.
    pub score: Score,
    /// Last completed iteration, `None` if the game is over.
    pub depth: Option<Depth>,
    /// Number of visited nodes.
    pub nodes: u64,
    /// Why the search returned.
    pub stop: StopReason,
    /// Expected continuation, starting with the best move.
    pub pv: Vec<A>,
}

/// Searches positions of any [`Game`] scored by the evaluator `E`.
#[derive(Debug)]
pub struct Searcher<E> {
    table: TranspositionTable,
    evaluator: E,
    config: Config,
}

impl<E> Searcher<E> {
    /// Creates a searcher, allocating the transposition table.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the table can not be
    /// allocated.
    pub fn new(config: Config, evaluator: E) -> Result<Self> {
        config.validate()?;
        let table = TranspositionTable::new(config.hash_bytes)?;
        Ok(Self {
            table,
            evaluator,
            config,
        })
    }

    /// Changes the memory budget of the table. Keeps the cached results if
    /// the table size does not change.
    ///
    /// # Errors
    ///
    /// Fails if the budget is too small or the table can not be allocated.
    pub fn set_hash_bytes(&mut self, bytes: usize) -> Result<()> {
        self.table.resize(bytes)?;
        self.config.hash_bytes = bytes;
        Ok(())
    }

    /// Changes the time budget of [`Searcher::search`].
    ///
    /// # Errors
    ///
    /// A zero budget is rejected.
    pub fn set_move_time(&mut self, move_time: Duration) -> Result<()> {
        if move_time.is_zero() {
            return Err(Error::ZeroTimeBudget);
        }
        self.config.move_time = move_time;
        Ok(())
    }

    /// Forgets all cached results, e.g. before a new game.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// The transposition table.
    #[must_use]
    pub const fn table(&self) -> &TranspositionTable {
        &self.table
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Searches the position within the configured time and depth budget.
    ///
    /// The game is mutated during the search and restored before returning.
    pub fn search<G>(&mut self, game: &mut G) -> SearchResult<G::Action>
    where
        G: Game,
        E: Evaluator<G>,
    {
        // The budget is validated by the configuration.
        let timer =
            Timer::with_limit(self.config.move_time).unwrap_or_else(|_| Timer::unlimited());
        self.search_with(game, self.config.max_depth, &timer)
    }

    /// Searches the position with iterative deepening up to `max_depth`
    /// (clamped to [`MAX_DEPTH`]) until `deadline` expires.
    ///
    /// # Panics
    ///
    /// Panics if the game generates no moves in a non-terminal position.
    pub fn search_with<G, D>(
        &mut self,
        game: &mut G,
        max_depth: Depth,
        deadline: &D,
    ) -> SearchResult<G::Action>
    where
        G: Game,
        E: Evaluator<G>,
        D: Deadline,
    {
        if let Some(outcome) = game.outcome() {
            return SearchResult {
                best_move: None,
                score: match outcome {
                    Outcome::Win => Score::win_in(0),
                    Outcome::Draw => Score::DRAW,
                    Outcome::Loss => Score::loss_in(0),
                },
                depth: None,
                nodes: 0,
                stop: StopReason::TerminalFound,
                pv: Vec::new(),
            };
        }
        let max_depth = max_depth.min(MAX_DEPTH);

        let mut moves = MoveList::new();
        game.generate_moves(&mut moves);
        assert!(
            !moves.is_empty(),
            "game generated no moves in a non-terminal position"
        );
        let mut root = RootMoves::new(moves);

        let mut context = Context::new(game, &self.evaluator, Some(&mut self.table), deadline);
        let mut completed = 0;
        let mut stop = StopReason::DepthLimitReached;
        for depth in 0..=max_depth {
            if !context.search_root(&mut root, depth) {
                log::debug!("depth {depth} interrupted, keeping depth {completed}");
                stop = StopReason::TimedOut;
                break;
            }
            root.sort();
            completed = depth;
            let best = *root.best();
            context.store_root(best.action, best.score, depth);
            log::debug!(
                "depth {depth} score {} best {:?} nodes {}",
                best.score,
                best.action,
                context.nodes()
            );
            log::trace!("root moves: {}", root.summary());
            if best.score.is_win() || root.all_lost() {
                stop = StopReason::TerminalFound;
                break;
            }
            if depth < max_depth && deadline.expired() {
                stop = StopReason::TimedOut;
                break;
            }
        }

        let best = *root.best();
        let pv = context.principal_variation(best.action, usize::from(completed) + 1);
        SearchResult {
            best_move: Some(best.action),
            score: best.score,
            depth: Some(completed),
            nodes: context.nodes(),
            stop,
            pv,
        }
    }
}
