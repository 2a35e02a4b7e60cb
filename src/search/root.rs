//! Moves at the root, kept in a priority list so that a best guess is always
//! available when the search has to stop early.

use std::ops::Index;

use itertools::Itertools;

use crate::evaluation::Score;
use crate::game::Action;

/// Root move with its score from the latest completed iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootMove<A> {
    /// The move.
    pub action: A,
    /// Score of the move, `-INFINITY` until it is searched.
    pub score: Score,
    previous_score: Score,
}

impl<A: Action> RootMove<A> {
    /// Unsearched move.
    #[must_use]
    pub fn new(action: A) -> Self {
        Self {
            action,
            score: -Score::INFINITY,
            previous_score: -Score::INFINITY,
        }
    }
}

/// Root moves ordered by descending score.
///
/// Re-sorting is stable: moves with equal scores keep their relative order, so
/// the choice between equally good moves does not flicker from one iteration
/// (or one turn) to the next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootMoves<A> {
    moves: Vec<RootMove<A>>,
}

impl<A: Action> RootMoves<A> {
    /// Root moves in generation order.
    #[must_use]
    pub fn new(actions: impl IntoIterator<Item = A>) -> Self {
        Self {
            moves: actions.into_iter().map(RootMove::new).collect(),
        }
    }

    /// Starts a new iteration: the current scores become the fallback if the
    /// iteration does not complete.
    pub fn begin_iteration(&mut self) {
        for root_move in &mut self.moves {
            root_move.previous_score = root_move.score;
        }
    }

    /// Drops scores of an interrupted iteration.
    pub fn rollback(&mut self) {
        for root_move in &mut self.moves {
            root_move.score = root_move.previous_score;
        }
    }

    /// Records the score of the `i`-th move.
    pub fn set_score(&mut self, i: usize, score: Score) {
        self.moves[i].score = score;
    }

    /// Stable sort by descending score.
    pub fn sort(&mut self) {
        self.moves.sort_by(|a, b| b.score.cmp(&a.score));
    }

    /// Current best guess.
    ///
    /// # Panics
    ///
    /// Panics if there are no root moves.
    #[must_use]
    pub fn best(&self) -> &RootMove<A> {
        &self.moves[0]
    }

    /// Returns `true` if every move is a proven loss.
    #[must_use]
    pub fn all_lost(&self) -> bool {
        self.moves.iter().all(|root_move| root_move.score.is_loss())
    }

    /// Number of root moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Returns `true` if there are no root moves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Iterates over the moves in their current order.
    pub fn iter(&self) -> impl Iterator<Item = &RootMove<A>> {
        self.moves.iter()
    }

    /// Human-readable summary, e.g. for debug logs.
    #[must_use]
    pub fn summary(&self) -> String {
        self.moves
            .iter()
            .map(|root_move| format!("{:?}: {}", root_move.action, root_move.score))
            .join(", ")
    }
}

impl<A> Index<usize> for RootMoves<A> {
    type Output = RootMove<A>;

    fn index(&self, i: usize) -> &Self::Output {
        &self.moves[i]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Id(u16);

    impl Action for Id {
        fn index(self) -> u16 {
            self.0
        }
    }

    fn order(moves: &RootMoves<Id>) -> Vec<u16> {
        moves.iter().map(|root_move| root_move.action.0).collect()
    }

    #[test]
    fn sorts_by_descending_score() {
        let mut moves = RootMoves::new([Id(0), Id(1), Id(2)]);
        moves.set_score(0, Score::cp(-5));
        moves.set_score(1, Score::cp(30));
        moves.set_score(2, Score::cp(7));
        moves.sort();
        assert_eq!(order(&moves), vec![1, 2, 0]);
        assert_eq!(moves.best().score, Score::cp(30));
    }

    #[test]
    fn ties_keep_previous_order() {
        let mut moves = RootMoves::new((0..6).map(Id));
        for i in 0..6 {
            moves.set_score(i, Score::cp(if i % 2 == 0 { 1 } else { 2 }));
        }
        moves.sort();
        assert_eq!(order(&moves), vec![1, 3, 5, 0, 2, 4]);
        // Unchanged scores never change the order.
        for _ in 0..3 {
            moves.sort();
            assert_eq!(order(&moves), vec![1, 3, 5, 0, 2, 4]);
        }
    }

    #[test]
    fn rollback_restores_last_iteration() {
        let mut moves = RootMoves::new([Id(0), Id(1)]);
        moves.set_score(0, Score::cp(3));
        moves.set_score(1, Score::cp(4));
        moves.sort();
        moves.begin_iteration();
        moves.set_score(0, Score::loss_in(2));
        moves.rollback();
        assert_eq!(moves[0].score, Score::cp(4));
        assert_eq!(moves[1].score, Score::cp(3));
        assert!(!moves.all_lost());
    }
}
