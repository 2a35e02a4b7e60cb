//! Interface between the search and the rules of a particular game.
//!
//! The search never copies positions: it mutates one [`Game`] in place with
//! [`Game::apply`] and restores it with [`Game::undo`] in strict stack order.

use std::fmt;
use std::ops::Not;

use anyhow::bail;
use arrayvec::ArrayVec;

use crate::zobrist::Key;

/// Upper bound on the number of legal moves in any position.
pub const MAX_MOVES: usize = 256;

/// Fixed-capacity list of moves generated in a single position.
pub type MoveList<A> = ArrayVec<A, MAX_MOVES>;

/// Two-player games are played between White (having the advantage of the
/// first turn) and Black. Single-agent games only ever have White to move.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    White,
    Black,
}

impl Player {
    /// Dense index of the player, handy for per-player tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }
}

impl Not for Player {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl TryFrom<&str> for Player {
    type Error = anyhow::Error;

    fn try_from(player: &str) -> anyhow::Result<Self> {
        match player {
            "w" => Ok(Self::White),
            "b" => Ok(Self::Black),
            _ => bail!("player should be 'w' or 'b', got '{player}'"),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match &self {
                Self::White => 'w',
                Self::Black => 'b',
            }
        )
    }
}

/// Result of a finished game from the perspective of the player to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    #[allow(missing_docs)]
    Win,
    #[allow(missing_docs)]
    Draw,
    #[allow(missing_docs)]
    Loss,
}

/// A move: a small value type identifying one action of the game.
///
/// "No move" is `Option::<A>::None` wherever the engine reports one.
pub trait Action: Copy + Eq + fmt::Debug {
    /// Stable encoding of the action, used to store the best move in the
    /// transposition table. Must be below `u16::MAX`.
    fn index(self) -> u16;

    /// The "null move": a pass or wait that leaves everything but the clock
    /// untouched. Null moves are searched after regular ones.
    fn is_null(self) -> bool {
        false
    }
}

/// Mutable game state the search walks through.
///
/// Implementations must keep [`Game::key`] up to date incrementally in
/// [`Game::apply`] and [`Game::undo`], and must generate at least one move in
/// every non-terminal position.
pub trait Game {
    /// Moves of the game.
    type Action: Action;
    /// Whatever [`Game::apply`] needs to hand back to [`Game::undo`].
    type Undo;

    /// Whether players alternate every ply (adversarial games). Single-agent
    /// games set this to `false`: values are then never negated between plies.
    const ALTERNATING: bool = true;

    /// Plays the move, mutating the state in place.
    fn apply(&mut self, action: Self::Action) -> Self::Undo;

    /// Takes back the most recently applied move.
    ///
    /// # Panics
    ///
    /// Implementations panic if there is nothing to take back.
    fn undo(&mut self, undo: Self::Undo);

    /// Appends all legal moves to `moves`. The list is empty only if the game
    /// is over.
    fn generate_moves(&self, moves: &mut MoveList<Self::Action>);

    /// Result of the game if it is over.
    fn outcome(&self) -> Option<Outcome>;

    /// Returns `true` if no more moves can be played.
    fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }

    /// Zobrist key of the current state.
    fn key(&self) -> Key;

    /// Cheap static guess of how promising the move is: higher is searched
    /// first. Only affects pruning efficiency, never the result.
    fn move_priority(&self, _action: Self::Action) -> i32 {
        0
    }
}
