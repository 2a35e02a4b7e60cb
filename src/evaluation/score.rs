use std::cmp::Ordering;
use std::fmt::Display;
use std::ops::Neg;

use crate::search::{Ply, MAX_PLY};

/// The score represents the relative value of the position from the
/// perspective of the player to move, or a forced win/loss in N plies (if one
/// is found).
///
/// A compact i32 representation is used in both cases. Scores are stored as
/// `i16` in [`crate::search::transposition::TranspositionTable`], so every
/// valid score fits into 16 bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score {
    value: i32,
}

impl Score {
    /// Strictly outside of any score the search can produce.
    pub const INFINITY: Self = Self { value: 32_001 };
    /// Win on the spot.
    pub const WIN: Self = Self { value: 32_000 };
    /// Game-theoretic draw.
    pub const DRAW: Self = Self { value: 0 };
    /// Evaluators must stay within `[-EVAL_LIMIT, EVAL_LIMIT]`.
    pub const EVAL_LIMIT: i32 = 5_000;

    /// `(WIN - KNOWN_RANGE, WIN]` and `[-WIN, -WIN + KNOWN_RANGE)` are
    /// reserved for proven results.
    const KNOWN_RANGE: i32 = MAX_PLY as i32;

    /// Creates a heuristic score.
    ///
    /// # Panics
    ///
    /// Panics if the value is outside of `[-EVAL_LIMIT, EVAL_LIMIT]`.
    #[must_use]
    pub fn cp(value: i32) -> Self {
        assert!(
            value.abs() <= Self::EVAL_LIMIT,
            "evaluation {value} is outside of the normal range"
        );
        Self { value }
    }

    /// Heuristic score clamped into the normal evaluation range.
    #[must_use]
    pub fn saturating(value: i32) -> Self {
        Self {
            value: value.clamp(-Self::EVAL_LIMIT, Self::EVAL_LIMIT),
        }
    }

    /// Victory of the player to move at the root, reached `ply` plies from the
    /// root. Closer wins score higher.
    #[must_use]
    pub const fn win_in(ply: Ply) -> Self {
        Self {
            value: Self::WIN.value - ply as i32,
        }
    }

    /// Defeat `ply` plies from the root. Later defeats score higher.
    #[must_use]
    pub const fn loss_in(ply: Ply) -> Self {
        Self {
            value: -Self::WIN.value + ply as i32,
        }
    }

    /// Returns `true` for a proven win.
    #[must_use]
    pub const fn is_win(self) -> bool {
        self.value > Self::WIN.value - Self::KNOWN_RANGE
    }

    /// Returns `true` for a proven loss.
    #[must_use]
    pub const fn is_loss(self) -> bool {
        self.value < -Self::WIN.value + Self::KNOWN_RANGE
    }

    /// Returns `true` if the score is a proven result rather than a heuristic
    /// evaluation.
    #[must_use]
    pub const fn is_known(self) -> bool {
        self.is_win() || self.is_loss()
    }

    /// Plies until the proven result.
    ///
    /// # Panics
    ///
    /// Panics if the score is not a proven result.
    #[must_use]
    pub fn plies(self) -> Ply {
        assert!(self.is_known());
        (Self::WIN.value - self.value.abs()) as Ply
    }

    /// Raw value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.value
    }

    /// Converts a score computed `ply` plies from the root into a
    /// path-independent one (distance from the node instead of the root).
    #[must_use]
    pub fn to_table(self, ply: Ply) -> i16 {
        let value = if self.is_win() {
            self.value + ply as i32
        } else if self.is_loss() {
            self.value - ply as i32
        } else {
            self.value
        };
        debug_assert!(i16::try_from(value).is_ok());
        value as i16
    }

    /// Reverses [`Score::to_table`] for a node `ply` plies from the root.
    #[must_use]
    pub fn from_table(value: i16, ply: Ply) -> Self {
        let score = Self {
            value: i32::from(value),
        };
        if score.is_win() {
            Self {
                value: score.value - ply as i32,
            }
        } else if score.is_loss() {
            Self {
                value: score.value + ply as i32,
            }
        } else {
            score
        }
    }
}

impl Neg for Score {
    type Output = Self;

    /// Mirrors the score to the other player's perspective.
    fn neg(self) -> Self::Output {
        Self { value: -self.value }
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_known() {
            match self.value.cmp(&0) {
                Ordering::Greater => write!(f, "win {}", self.plies()),
                _ => write!(f, "loss {}", self.plies()),
            }
        } else {
            write!(f, "cp {}", self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known() {
        assert!(Score::win_in(3).is_win());
        assert!(Score::loss_in(3).is_loss());
        assert_eq!(Score::win_in(3).plies(), 3);
        assert_eq!(Score::loss_in(7).plies(), 7);
        assert_eq!(-Score::win_in(5), Score::loss_in(5));
        assert!(!Score::cp(Score::EVAL_LIMIT).is_known());
        assert!(!Score::DRAW.is_known());
    }

    #[test]
    fn faster_is_better() {
        assert!(Score::win_in(1) > Score::win_in(2));
        assert!(Score::loss_in(1) < Score::loss_in(2));
        assert!(Score::win_in(MAX_PLY - 1) > Score::cp(Score::EVAL_LIMIT));
        assert!(Score::loss_in(MAX_PLY - 1) < Score::cp(-Score::EVAL_LIMIT));
        assert!(Score::INFINITY > Score::win_in(0));
    }

    #[test]
    fn table_conversion() {
        // Win 5 plies from the root, found at ply 2: 3 plies from the node.
        let stored = Score::win_in(5).to_table(2);
        assert_eq!(Score::from_table(stored, 2), Score::win_in(5));
        // Same node reached at ply 4 wins 7 plies from the root.
        assert_eq!(Score::from_table(stored, 4), Score::win_in(7));
        let stored = Score::loss_in(6).to_table(1);
        assert_eq!(Score::from_table(stored, 3), Score::loss_in(8));
        assert_eq!(Score::from_table(Score::cp(-42).to_table(9), 1), Score::cp(-42));
    }

    #[test]
    fn display() {
        assert_eq!(Score::cp(123).to_string(), "cp 123");
        assert_eq!(Score::win_in(3).to_string(), "win 3");
        assert_eq!(Score::loss_in(2).to_string(), "loss 2");
    }

    #[test]
    fn saturating() {
        assert_eq!(Score::saturating(1_000_000), Score::cp(Score::EVAL_LIMIT));
        assert_eq!(Score::saturating(-7), Score::cp(-7));
    }

    #[test]
    #[should_panic]
    fn cp_panic() {
        let _ = Score::cp(Score::EVAL_LIMIT + 1);
    }
}
