//! [Breakthrough]: two rows of pawns per side on an 8x8 board.
//!
//! Pawns move one row forward, either straight to an empty square or
//! diagonally to an empty square or onto an enemy pawn, capturing it. The
//! first player to reach the far row wins, and so does the one who captures
//! all enemy pawns. Every move advances a pawn, so games are finite and draws
//! are impossible. A side with pawns always has a move: the diagonals of its
//! most advanced pawn can not both hold friendly pawns.
//!
//! [Breakthrough]: https://en.wikipedia.org/wiki/Breakthrough_(board_game)

use std::fmt;

use anyhow::bail;

use crate::evaluation::Score;
use crate::game::{Action, Game, MoveList, Outcome, Player};
use crate::zobrist::{Key, Zobrist};

/// Number of columns and rows.
pub const BOARD_WIDTH: u8 = 8;
const SQUARES: usize = (BOARD_WIDTH * BOARD_WIDTH) as usize;
/// Feature index of "Black to move".
const BLACK_TO_MOVE: usize = 2 * SQUARES;

const PAWN_VALUE: i32 = 100;

const fn feature(player: Player, square: Square) -> usize {
    player.index() * SQUARES + square.index()
}

/// Direction pawns of the player move in.
const fn forward(player: Player) -> i8 {
    match player {
        Player::White => 1,
        Player::Black => -1,
    }
}

/// Row reaching which wins the game.
const fn goal_row(player: Player) -> u8 {
    match player {
        Player::White => BOARD_WIDTH - 1,
        Player::Black => 0,
    }
}

/// Square of the board, `a1` is White's bottom left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Square(u8);

impl Square {
    /// Square at the given column and row, both zero-based.
    #[must_use]
    pub fn new(column: u8, row: u8) -> Option<Self> {
        (column < BOARD_WIDTH && row < BOARD_WIDTH).then(|| Self(row * BOARD_WIDTH + column))
    }

    /// Zero-based column, `a` is 0.
    #[must_use]
    pub const fn column(self) -> u8 {
        self.0 % BOARD_WIDTH
    }

    /// Zero-based row, White starts on rows 0 and 1.
    #[must_use]
    pub const fn row(self) -> u8 {
        self.0 / BOARD_WIDTH
    }

    const fn index(self) -> usize {
        self.0 as usize
    }

    /// Distance from the home row of `player`.
    const fn advancement(self, player: Player) -> u8 {
        match player {
            Player::White => self.row(),
            Player::Black => BOARD_WIDTH - 1 - self.row(),
        }
    }

    fn shift(self, columns: i8, rows: i8) -> Option<Self> {
        let column = self.column().checked_add_signed(columns)?;
        let row = self.row().checked_add_signed(rows)?;
        Self::new(column, row)
    }

    fn all() -> impl Iterator<Item = Self> {
        (0..SQUARES as u8).map(Self)
    }
}

impl TryFrom<&str> for Square {
    type Error = anyhow::Error;

    fn try_from(square: &str) -> anyhow::Result<Self> {
        let bytes = square.as_bytes();
        if bytes.len() != 2 {
            bail!("square should be two characters (e.g. a2), got '{square}'");
        }
        match Self::new(bytes[0].wrapping_sub(b'a'), bytes[1].wrapping_sub(b'1')) {
            Some(square) => Ok(square),
            None => bail!("unknown square: '{square}'"),
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            char::from(b'a' + self.column()),
            char::from(b'1' + self.row())
        )
    }
}

/// A pawn moving from one square to an adjacent one on the next row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    from: Square,
    to: Square,
}

impl Move {
    /// Origin of the pawn.
    #[must_use]
    pub const fn from(self) -> Square {
        self.from
    }

    /// Destination of the pawn.
    #[must_use]
    pub const fn to(self) -> Square {
        self.to
    }
}

impl Action for Move {
    fn index(self) -> u16 {
        let direction = self.to.column() + 1 - self.from.column();
        u16::from(self.from.0) * 3 + u16::from(direction)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// What [`Breakthrough::undo`](Game::undo) needs to take a move back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Undo {
    action: Move,
    captured: bool,
}

/// Breakthrough position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Breakthrough {
    board: [Option<Player>; SQUARES],
    to_move: Player,
    pawns: [u8; 2],
    key: Key,
    zobrist: Zobrist,
    plies: u16,
}

impl Breakthrough {
    /// Starting position with White to move. `seed` selects the Zobrist
    /// keys.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut board = [None; SQUARES];
        for square in Square::all() {
            board[square.index()] = match square.row() {
                0 | 1 => Some(Player::White),
                6 | 7 => Some(Player::Black),
                _ => None,
            };
        }
        Self::from_board(board, Player::White, seed)
    }

    fn from_board(board: [Option<Player>; SQUARES], to_move: Player, seed: u64) -> Self {
        let mut result = Self {
            board,
            to_move,
            pawns: [0; 2],
            key: 0,
            zobrist: Zobrist::new(2 * SQUARES + 1, seed),
            plies: 0,
        };
        for player in result.board.iter().flatten() {
            result.pawns[player.index()] += 1;
        }
        result.key = result.compute_key();
        result
    }

    /// Parses rows from the top (row 8) to the bottom separated by `/`, each
    /// made of `w`, `b` and `.` for an empty square, followed by the side to
    /// move: `bbbbbbbb/bbbbbbbb/......../......../......../......../wwwwwwww/wwwwwwww w`.
    ///
    /// # Errors
    ///
    /// Fails on malformed input.
    pub fn from_notation(input: &str, seed: u64) -> anyhow::Result<Self> {
        let mut parts = input.split(' ');
        let Some(placement) = parts.next() else {
            bail!("incorrect position: missing pawns placement");
        };
        let mut board = [None; SQUARES];
        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != usize::from(BOARD_WIDTH) {
            bail!("incorrect position: expected {BOARD_WIDTH} rows, got {placement}");
        }
        for (row, symbols) in (0..BOARD_WIDTH).rev().zip(rows) {
            if symbols.len() != usize::from(BOARD_WIDTH) {
                bail!("incorrect position: row should have {BOARD_WIDTH} squares, got {symbols}");
            }
            for (column, symbol) in (0..BOARD_WIDTH).zip(symbols.chars()) {
                let Some(square) = Square::new(column, row) else {
                    bail!("square out of the board");
                };
                board[square.index()] = match symbol {
                    'w' => Some(Player::White),
                    'b' => Some(Player::Black),
                    '.' => None,
                    _ => bail!("unknown square symbol: '{symbol}'"),
                };
            }
        }
        let to_move = match parts.next() {
            Some(value) => value.try_into()?,
            None => bail!("incorrect position: missing side to move"),
        };
        match parts.next() {
            None => Ok(Self::from_board(board, to_move, seed)),
            Some(_) => bail!("trailing symbols are not allowed in position"),
        }
    }

    fn compute_key(&self) -> Key {
        let pawns = Square::all().filter_map(|square| {
            self.board[square.index()].map(|player| feature(player, square))
        });
        let side = (self.to_move == Player::Black).then_some(BLACK_TO_MOVE);
        self.zobrist.compose(pawns.chain(side))
    }

    /// Player to move.
    #[must_use]
    pub const fn to_move(&self) -> Player {
        self.to_move
    }

    /// Pawn standing on the square, if any.
    #[must_use]
    pub fn at(&self, square: Square) -> Option<Player> {
        self.board[square.index()]
    }

    /// Number of pawns `player` has left.
    #[must_use]
    pub const fn pawns(&self, player: Player) -> u8 {
        self.pawns[player.index()]
    }

    fn reached_goal(&self, player: Player) -> bool {
        (0..BOARD_WIDTH)
            .filter_map(|column| Square::new(column, goal_row(player)))
            .any(|square| self.at(square) == Some(player))
    }

    /// Calls `visit` for every legal move of the side to move.
    fn for_each_move(&self, mut visit: impl FnMut(Move)) {
        let player = self.to_move;
        for from in Square::all().filter(|&square| self.at(square) == Some(player)) {
            for columns in [-1, 0, 1] {
                let Some(to) = from.shift(columns, forward(player)) else {
                    continue;
                };
                let legal = match self.at(to) {
                    None => true,
                    // Captures are diagonal only.
                    Some(occupant) => occupant != player && columns != 0,
                };
                if legal {
                    visit(Move { from, to });
                }
            }
        }
    }
}

impl Game for Breakthrough {
    type Action = Move;
    type Undo = Undo;

    fn apply(&mut self, action: Move) -> Undo {
        let player = self.to_move;
        assert_eq!(
            self.at(action.from),
            Some(player),
            "no pawn to move at {}",
            action.from
        );
        let captured = match self.at(action.to) {
            None => false,
            Some(occupant) => {
                assert_ne!(occupant, player, "{action} captures an own pawn");
                self.pawns[occupant.index()] -= 1;
                self.key ^= self.zobrist.key(feature(occupant, action.to));
                true
            },
        };
        self.board[action.from.index()] = None;
        self.board[action.to.index()] = Some(player);
        self.key ^= self.zobrist.key(feature(player, action.from))
            ^ self.zobrist.key(feature(player, action.to))
            ^ self.zobrist.key(BLACK_TO_MOVE);
        self.to_move = !player;
        self.plies += 1;
        Undo { action, captured }
    }

    fn undo(&mut self, undo: Undo) {
        assert!(self.plies > 0, "undo without a matching move");
        let Undo { action, captured } = undo;
        let player = !self.to_move;
        assert_eq!(
            self.at(action.to),
            Some(player),
            "undo does not match the last move"
        );
        self.plies -= 1;
        self.to_move = player;
        self.board[action.from.index()] = Some(player);
        self.key ^= self.zobrist.key(feature(player, action.from))
            ^ self.zobrist.key(feature(player, action.to))
            ^ self.zobrist.key(BLACK_TO_MOVE);
        if captured {
            let opponent = !player;
            self.board[action.to.index()] = Some(opponent);
            self.pawns[opponent.index()] += 1;
            self.key ^= self.zobrist.key(feature(opponent, action.to));
        } else {
            self.board[action.to.index()] = None;
        }
    }

    fn generate_moves(&self, moves: &mut MoveList<Move>) {
        if self.is_terminal() {
            return;
        }
        self.for_each_move(|action| moves.push(action));
    }

    fn outcome(&self) -> Option<Outcome> {
        let player = self.to_move;
        if self.reached_goal(!player) || self.pawns(player) == 0 {
            return Some(Outcome::Loss);
        }
        if self.reached_goal(player) || self.pawns(!player) == 0 {
            return Some(Outcome::Win);
        }
        None
    }

    fn key(&self) -> Key {
        self.key
    }

    fn move_priority(&self, action: Move) -> i32 {
        let player = self.to_move;
        if action.to.row() == goal_row(player) {
            return 1000;
        }
        let mut priority = i32::from(action.to.advancement(player));
        if self.at(action.to).is_some() {
            priority += 100;
            // Capturing a pawn that broke into our home rows is urgent.
            priority += 10 * i32::from(action.to.advancement(!player));
        }
        priority
    }
}

impl fmt::Display for Breakthrough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..BOARD_WIDTH).rev() {
            for column in 0..BOARD_WIDTH {
                let symbol = match Square::new(column, row).and_then(|square| self.at(square)) {
                    Some(Player::White) => 'w',
                    Some(Player::Black) => 'b',
                    None => '.',
                };
                write!(f, "{symbol}")?;
            }
            if row > 0 {
                write!(f, "/")?;
            }
        }
        write!(f, " {}", self.to_move)
    }
}

/// Material with a bonus growing quadratically as pawns advance.
#[must_use]
pub fn evaluate(game: &Breakthrough) -> Score {
    let player = game.to_move;
    let score: i32 = Square::all()
        .filter_map(|square| game.at(square).map(|owner| (square, owner)))
        .map(|(square, owner)| {
            let advancement = i32::from(square.advancement(owner));
            let value = PAWN_VALUE + advancement * advancement;
            if owner == player {
                value
            } else {
                -value
            }
        })
        .sum();
    Score::saturating(score)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn square(name: &str) -> Square {
        Square::try_from(name).unwrap()
    }

    fn play(game: &mut Breakthrough, name: &str) -> Undo {
        let action = Move {
            from: square(&name[..2]),
            to: square(&name[2..]),
        };
        game.apply(action)
    }

    fn moves(game: &Breakthrough) -> Vec<String> {
        let mut moves = MoveList::new();
        game.generate_moves(&mut moves);
        moves.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn starting_position() {
        let game = Breakthrough::new(0);
        assert_eq!(
            game.to_string(),
            "bbbbbbbb/bbbbbbbb/......../......../......../......../wwwwwwww/wwwwwwww w"
        );
        assert_eq!(game.pawns(Player::White), 16);
        assert_eq!(game.pawns(Player::Black), 16);
        // Only the front row can move: 2 + 6 * 3 moves.
        assert_eq!(moves(&game).len(), 22);
        assert_eq!(game.outcome(), None);
        assert_eq!(evaluate(&game), Score::DRAW);
    }

    #[test]
    fn parse() {
        let game = Breakthrough::from_notation(
            "......../......../......../...b..../....w.../......../......../........ w",
            0,
        )
        .unwrap();
        assert_eq!(game.at(square("d5")), Some(Player::Black));
        assert_eq!(game.at(square("e4")), Some(Player::White));
        assert_eq!(moves(&game), vec!["e4d5", "e4e5", "e4f5"]);
        assert!(Breakthrough::from_notation("bbbbbbbb w", 0).is_err());
        assert!(Breakthrough::from_notation(
            "......../......../......../......../......../......../......../........",
            0
        )
        .is_err());
        assert!(Breakthrough::from_notation(
            "......../......../......../......../......../......../......../.......x w",
            0
        )
        .is_err());
    }

    #[test]
    fn straight_moves_do_not_capture() {
        let game = Breakthrough::from_notation(
            "......../......../......../....b.../....w.../......../......../........ w",
            0,
        )
        .unwrap();
        assert_eq!(moves(&game), vec!["e4d5", "e4f5"]);
    }

    #[test]
    fn apply_and_undo_restore_everything() {
        let mut game = Breakthrough::from_notation(
            "......../......../......../...b..../....w.../......../......../w....... w",
            5,
        )
        .unwrap();
        let initial = game.clone();
        let capture = play(&mut game, "e4d5");
        assert_eq!(game.pawns(Player::Black), 0);
        assert_eq!(game.outcome(), Some(Outcome::Loss));
        game.undo(capture);
        assert_eq!(game, initial);

        let mut game = Breakthrough::new(5);
        let initial = game.clone();
        let first = play(&mut game, "b2b3");
        let second = play(&mut game, "g7g6");
        game.undo(second);
        game.undo(first);
        assert_eq!(game, initial);
    }

    #[test]
    #[should_panic(expected = "undo without a matching move")]
    fn undo_without_apply() {
        let mut game = Breakthrough::new(0);
        game.undo(Undo {
            action: Move {
                from: square("a2"),
                to: square("a3"),
            },
            captured: false,
        });
    }

    #[test]
    fn incremental_key_matches_parsed_position() {
        let mut game = Breakthrough::new(11);
        let _ = play(&mut game, "a2a3");
        let _ = play(&mut game, "h7h6");
        let parsed = Breakthrough::from_notation(&game.to_string(), 11).unwrap();
        assert_eq!(game.key(), parsed.key());
    }

    #[test]
    fn transpositions_share_keys() {
        let mut a = Breakthrough::new(0);
        let mut b = Breakthrough::new(0);
        for name in ["a2a3", "a7a6", "h2h3"] {
            let _ = play(&mut a, name);
        }
        for name in ["h2h3", "a7a6", "a2a3"] {
            let _ = play(&mut b, name);
        }
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), Breakthrough::new(0).key());
    }

    #[test]
    fn reaching_the_far_row_wins() {
        let mut game = Breakthrough::from_notation(
            "b......./....w.../......../......../......../......../......../........ w",
            0,
        )
        .unwrap();
        let winning = Move {
            from: square("e7"),
            to: square("e8"),
        };
        assert_eq!(game.move_priority(winning), 1000);
        let _ = game.apply(winning);
        assert_eq!(game.outcome(), Some(Outcome::Loss));
        assert!(moves(&game).is_empty());
    }

    #[test]
    fn captures_are_diagonal() {
        let game = Breakthrough::from_notation(
            "b......./......../......../......../......../......../bb....../w....... w",
            0,
        )
        .unwrap();
        assert_eq!(moves(&game), vec!["a1b2"]);
    }

    #[test]
    fn captures_come_before_quiet_moves() {
        let game = Breakthrough::from_notation(
            "......../......../......../...b..../....w.../......../......../........ w",
            0,
        )
        .unwrap();
        let capture = Move {
            from: square("e4"),
            to: square("d5"),
        };
        let quiet = Move {
            from: square("e4"),
            to: square("e5"),
        };
        assert!(game.move_priority(capture) > game.move_priority(quiet));
    }
}
