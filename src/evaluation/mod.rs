//! "Static" [evaluation], i.e. predicting the relative value of a position
//! without [`crate::search`].
//!
//! [evaluation]: https://www.chessprogramming.org/Evaluation

mod score;

pub use score::Score;

use crate::game::Game;

/// Scores a position from the perspective of the player to move.
///
/// The result must stay within `[-Score::EVAL_LIMIT, Score::EVAL_LIMIT]` so
/// that proven wins and losses are always ranked outside of heuristic values.
/// Terminal positions are scored by the search itself and never reach the
/// evaluator.
pub trait Evaluator<G: Game> {
    /// Static score of `game` for the side to move.
    fn evaluate(&self, game: &G) -> Score;
}

impl<G: Game, F: Fn(&G) -> Score> Evaluator<G> for F {
    fn evaluate(&self, game: &G) -> Score {
        self(game)
    }
}
