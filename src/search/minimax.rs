//! Implementation of [Minimax] algorithm with [Negamax] and [Alpha-Beta
//! pruning] extensions.
//!
//! Values are always "goodness for the player about to move". For alternating
//! games the caller negates the value of a child and swaps the window; for
//! single-agent games ([`Game::ALTERNATING`] is `false`) values and windows
//! pass through unchanged.
//!
//! [Minimax]: https://en.wikipedia.org/wiki/Minimax
//! [Negamax]: https://en.wikipedia.org/wiki/Negamax
//! [Alpha-Beta pruning]: https://en.wikipedia.org/wiki/Alpha%E2%80%93beta_pruning

use std::cmp::Reverse;

use crate::evaluation::{Evaluator, Score};
use crate::game::{Action, Game, MoveList, Outcome};
use crate::search::root::RootMoves;
use crate::search::time::Deadline;
use crate::search::transposition::{Bound, TranspositionTable};
use crate::search::{Depth, Ply, MAX_PLY};

/// Nodes this close to the root poll the deadline before expanding children.
const POLL_PLY: Ply = 3;

fn terminal_score(outcome: Outcome, ply: Ply) -> Score {
    match outcome {
        Outcome::Win => Score::win_in(ply),
        Outcome::Draw => Score::DRAW,
        Outcome::Loss => Score::loss_in(ply),
    }
}

/// Value of a child from the parent's perspective.
fn from_child<G: Game>(score: Score) -> Score {
    if G::ALTERNATING {
        -score
    } else {
        score
    }
}

/// Search window of a child.
fn child_window<G: Game>(alpha: Score, beta: Score) -> (Score, Score) {
    if G::ALTERNATING {
        (-beta, -alpha)
    } else {
        (alpha, beta)
    }
}

fn generate<G: Game>(game: &G) -> MoveList<G::Action> {
    let mut moves = MoveList::new();
    game.generate_moves(&mut moves);
    assert!(
        !moves.is_empty(),
        "game generated no moves in a non-terminal position"
    );
    moves
}

/// Deadline of searches that only stop at the depth limit.
struct Unbounded;

impl Deadline for Unbounded {
    fn expired(&self) -> bool {
        false
    }
}

/// Everything a single search needs, passed explicitly through the recursion.
pub(super) struct Context<'a, G: Game, E, D> {
    game: &'a mut G,
    evaluator: &'a E,
    table: Option<&'a mut TranspositionTable>,
    deadline: &'a D,
    nodes: u64,
    stopped: bool,
}

impl<'a, G: Game, E: Evaluator<G>, D: Deadline> Context<'a, G, E, D> {
    pub(super) fn new(
        game: &'a mut G,
        evaluator: &'a E,
        table: Option<&'a mut TranspositionTable>,
        deadline: &'a D,
    ) -> Self {
        Self {
            game,
            evaluator,
            table,
            deadline,
            nodes: 0,
            stopped: false,
        }
    }

    /// Number of visited nodes so far.
    pub(super) const fn nodes(&self) -> u64 {
        self.nodes
    }

    fn evaluate(&self) -> Score {
        let score = self.evaluator.evaluate(&*self.game);
        debug_assert!(
            !score.is_known(),
            "evaluation {score} collides with proven results"
        );
        score
    }

    /// Puts the table move first, then orders by the game's heuristic with
    /// null moves last among equals. The sort is stable, so generation order
    /// breaks the remaining ties.
    fn order(&self, moves: &mut MoveList<G::Action>, hint: Option<u16>) {
        moves.sort_by_key(|&action| {
            (
                Some(action.index()) != hint,
                Reverse(self.game.move_priority(action)),
                action.is_null(),
            )
        });
    }

    /// Searches every root move with `depth` plies left after it, recording
    /// the scores in `root`. Returns `false` (and restores the scores of the
    /// previous iteration) if the deadline interrupted the iteration.
    ///
    /// Depth 0 iterations only evaluate the children and never poll the
    /// deadline, so they always complete.
    pub(super) fn search_root(&mut self, root: &mut RootMoves<G::Action>, depth: Depth) -> bool {
        let mut alpha = -Score::INFINITY;
        let beta = Score::INFINITY;
        root.begin_iteration();
        self.nodes += 1;
        for i in 0..root.len() {
            let action = root[i].action;
            let undo = self.game.apply(action);
            let (child_alpha, child_beta) = child_window::<G>(alpha, beta);
            let score = from_child::<G>(self.negamax(depth, 1, child_alpha, child_beta));
            self.game.undo(undo);
            if self.stopped {
                root.rollback();
                return false;
            }
            root.set_score(i, score);
            alpha = alpha.max(score);
            if depth > 0 && i + 1 < root.len() && self.deadline.expired() {
                self.stopped = true;
                root.rollback();
                return false;
            }
        }
        true
    }

    /// Negamax search with alpha-beta pruning of the current position with
    /// `depth` plies left, `ply` plies away from the root.
    ///
    /// Returns a fail-soft value: exact inside `(alpha, beta)`, an upper bound
    /// at or below `alpha` and a lower bound at or above `beta`. If the
    /// deadline expires the returned value is meaningless and nothing is
    /// stored.
    pub(super) fn negamax(
        &mut self,
        depth: Depth,
        ply: Ply,
        mut alpha: Score,
        mut beta: Score,
    ) -> Score {
        self.nodes += 1;
        if let Some(outcome) = self.game.outcome() {
            return terminal_score(outcome, ply);
        }
        if depth == 0 || ply >= MAX_PLY - 1 {
            return self.evaluate();
        }
        if ply <= POLL_PLY && self.deadline.expired() {
            self.stopped = true;
            return Score::DRAW;
        }

        let key = self.game.key();
        let probe = self.table.as_deref().map(|table| table.probe(key));
        let mut hint = None;
        if let Some(hit) = probe.and_then(|probe| probe.hit) {
            hint = hit.action;
            let value = Score::from_table(hit.value, ply);
            // Proven results hold at any depth.
            let usable = hit.depth >= depth
                || (value.is_win() && matches!(hit.bound, Bound::Exact | Bound::Lower))
                || (value.is_loss() && matches!(hit.bound, Bound::Exact | Bound::Upper));
            if usable {
                match hit.bound {
                    Bound::Exact => return value,
                    Bound::Lower => alpha = alpha.max(value),
                    Bound::Upper => beta = beta.min(value),
                    Bound::None => {},
                }
                if alpha >= beta {
                    return value;
                }
            }
        }
        let window_alpha = alpha;

        let mut moves = generate(&*self.game);
        self.order(&mut moves, hint);

        let mut best_score = -Score::INFINITY;
        let mut best_move = None;
        for &action in &moves {
            let undo = self.game.apply(action);
            let (child_alpha, child_beta) = child_window::<G>(alpha, beta);
            let score = from_child::<G>(self.negamax(depth - 1, ply + 1, child_alpha, child_beta));
            self.game.undo(undo);
            if self.stopped {
                return Score::DRAW;
            }
            if score > best_score {
                best_score = score;
                best_move = Some(action);
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        // The opponent will never allow this node.
                        break;
                    }
                }
            }
        }

        if let (Some(table), Some(probe)) = (self.table.as_deref_mut(), probe) {
            let bound = if best_score >= beta {
                Bound::Lower
            } else if best_score > window_alpha {
                Bound::Exact
            } else {
                Bound::Upper
            };
            table.store(
                probe.slot,
                key,
                best_score.to_table(ply),
                depth,
                best_move.map(Action::index),
                bound,
            );
        }
        best_score
    }

    /// Records the result of a completed root iteration so that the next
    /// search (and the principal variation) can start from it.
    pub(super) fn store_root(&mut self, action: G::Action, score: Score, depth: Depth) {
        let key = self.game.key();
        if let Some(table) = self.table.as_deref_mut() {
            let probe = table.probe(key);
            table.store(
                probe.slot,
                key,
                score.to_table(0),
                depth + 1,
                Some(action.index()),
                Bound::Exact,
            );
        }
    }

    /// Follows best move hints in the table, starting with `first`.
    pub(super) fn principal_variation(&mut self, first: G::Action, length: usize) -> Vec<G::Action> {
        let mut pv = vec![first];
        let mut undos = vec![self.game.apply(first)];
        while pv.len() < length && !self.game.is_terminal() {
            let Some(table) = self.table.as_deref() else {
                break;
            };
            let Some(index) = table.probe(self.game.key()).hit.and_then(|hit| hit.action) else {
                break;
            };
            let mut moves = MoveList::new();
            self.game.generate_moves(&mut moves);
            // Tag collisions can suggest moves that are not legal here.
            let Some(&action) = moves.iter().find(|action| action.index() == index) else {
                break;
            };
            pv.push(action);
            undos.push(self.game.apply(action));
        }
        while let Some(undo) = undos.pop() {
            self.game.undo(undo);
        }
        pv
    }
}

/// Plain minimax value of the position searched `depth` plies deep, without
/// any pruning or caching. Exponentially slow: meant as a reference for
/// verifying [`alpha_beta`].
pub fn minimax<G: Game, E: Evaluator<G>>(game: &mut G, evaluator: &E, depth: Depth) -> Score {
    fn node<G: Game, E: Evaluator<G>>(game: &mut G, evaluator: &E, depth: Depth, ply: Ply) -> Score {
        if let Some(outcome) = game.outcome() {
            return terminal_score(outcome, ply);
        }
        if depth == 0 || ply >= MAX_PLY - 1 {
            return evaluator.evaluate(game);
        }
        let mut best = -Score::INFINITY;
        for action in generate(game) {
            let undo = game.apply(action);
            let score = from_child::<G>(node(game, evaluator, depth - 1, ply + 1));
            game.undo(undo);
            best = best.max(score);
        }
        best
    }
    node(game, evaluator, depth, 0)
}

/// Value of the position searched `depth` plies deep with alpha-beta pruning
/// and a full window, without a transposition table or deadline. Always
/// equal to [`minimax`] at the same depth.
pub fn alpha_beta<G: Game, E: Evaluator<G>>(game: &mut G, evaluator: &E, depth: Depth) -> Score {
    let mut context = Context::new(game, evaluator, None, &Unbounded);
    context.negamax(depth, 0, -Score::INFINITY, Score::INFINITY)
}
