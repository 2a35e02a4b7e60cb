//! [Tic-tac-toe]: small enough to be solved completely, which makes it the
//! yardstick for the correctness of the search.
//!
//! X is [`Player::White`] and always moves first.
//!
//! [Tic-tac-toe]: https://en.wikipedia.org/wiki/Tic-tac-toe

use std::fmt;

use anyhow::bail;
use arrayvec::ArrayVec;

use crate::evaluation::Score;
use crate::game::{Action, Game, MoveList, Outcome, Player};
use crate::zobrist::{Key, Zobrist};

const CELLS: usize = 9;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Feature index of "Black (O) to move".
const BLACK_TO_MOVE: usize = 2 * CELLS;

const fn feature(player: Player, cell: usize) -> usize {
    player.index() * CELLS + cell
}

/// Placing a mark on a cell, numbered row by row from the top left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell(u8);

impl Cell {
    /// Cell with the given index.
    ///
    /// # Errors
    ///
    /// Fails unless `index < 9`.
    pub fn new(index: u8) -> anyhow::Result<Self> {
        if usize::from(index) >= CELLS {
            bail!("cell index should be within 0..{CELLS}, got {index}");
        }
        Ok(Self(index))
    }

    const fn get(self) -> usize {
        self.0 as usize
    }
}

impl Action for Cell {
    fn index(self) -> u16 {
        u16::from(self.0)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tic-tac-toe board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicTacToe {
    cells: [Option<Player>; CELLS],
    to_move: Player,
    key: Key,
    zobrist: Zobrist,
    history: ArrayVec<Cell, CELLS>,
}

impl TicTacToe {
    /// Empty board with X to move. `seed` selects the Zobrist keys.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let zobrist = Zobrist::new(2 * CELLS + 1, seed);
        Self {
            cells: [None; CELLS],
            to_move: Player::White,
            key: 0,
            zobrist,
            history: ArrayVec::new(),
        }
    }

    /// Parses a board written row by row as nine characters: `x`, `o` or `.`
    /// for an empty cell. The side to move follows from the number of marks.
    ///
    /// The parsed marks can not be taken back.
    ///
    /// # Errors
    ///
    /// Fails on malformed input or if the mark counts are impossible.
    pub fn from_cells(input: &str, seed: u64) -> anyhow::Result<Self> {
        let mut result = Self::new(seed);
        let mut count = 0;
        for (cell, symbol) in input.chars().enumerate() {
            if cell >= CELLS {
                bail!("board should have exactly {CELLS} cells, got {input}");
            }
            result.cells[cell] = match symbol {
                'x' => Some(Player::White),
                'o' => Some(Player::Black),
                '.' => None,
                _ => bail!("unknown cell symbol: '{symbol}'"),
            };
            count += 1;
        }
        if count != CELLS {
            bail!("board should have exactly {CELLS} cells, got {input}");
        }
        let marks = |player| result.cells.iter().filter(|&&cell| cell == Some(player)).count();
        result.to_move = match marks(Player::White).checked_sub(marks(Player::Black)) {
            Some(0) => Player::White,
            Some(1) => Player::Black,
            _ => bail!("impossible number of marks: {input}"),
        };
        result.key = result.compute_key();
        Ok(result)
    }

    fn compute_key(&self) -> Key {
        let marks = self
            .cells
            .iter()
            .enumerate()
            .filter_map(|(cell, player)| player.map(|player| feature(player, cell)));
        let side = (self.to_move == Player::Black).then_some(BLACK_TO_MOVE);
        self.zobrist.compose(marks.chain(side))
    }

    /// Player to make the next mark.
    #[must_use]
    pub const fn to_move(&self) -> Player {
        self.to_move
    }

    fn has_line(&self, player: Player) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|&cell| self.cells[cell] == Some(player)))
    }

    fn completes_line(&self, cell: usize, player: Player) -> bool {
        LINES.iter().filter(|line| line.contains(&cell)).any(|line| {
            line.iter()
                .all(|&other| other == cell || self.cells[other] == Some(player))
        })
    }
}

impl Game for TicTacToe {
    type Action = Cell;
    type Undo = Cell;

    fn apply(&mut self, action: Cell) -> Cell {
        let cell = action.get();
        assert!(self.cells[cell].is_none(), "cell {cell} is occupied");
        self.cells[cell] = Some(self.to_move);
        self.key ^= self.zobrist.key(feature(self.to_move, cell)) ^ self.zobrist.key(BLACK_TO_MOVE);
        self.to_move = !self.to_move;
        self.history.push(action);
        action
    }

    fn undo(&mut self, undo: Cell) {
        assert_eq!(
            self.history.pop(),
            Some(undo),
            "undo does not match the last move"
        );
        let cell = undo.get();
        self.to_move = !self.to_move;
        self.cells[cell] = None;
        self.key ^= self.zobrist.key(feature(self.to_move, cell)) ^ self.zobrist.key(BLACK_TO_MOVE);
    }

    fn generate_moves(&self, moves: &mut MoveList<Cell>) {
        if self.is_terminal() {
            return;
        }
        moves.extend(
            (0..CELLS)
                .filter(|&cell| self.cells[cell].is_none())
                .map(|cell| Cell(cell as u8)),
        );
    }

    fn outcome(&self) -> Option<Outcome> {
        if self.has_line(!self.to_move) {
            return Some(Outcome::Loss);
        }
        if self.has_line(self.to_move) {
            return Some(Outcome::Win);
        }
        if self.cells.iter().all(Option::is_some) {
            return Some(Outcome::Draw);
        }
        None
    }

    fn key(&self) -> Key {
        self.key
    }

    fn move_priority(&self, action: Cell) -> i32 {
        let cell = action.get();
        if self.completes_line(cell, self.to_move) {
            return 10;
        }
        if self.completes_line(cell, !self.to_move) {
            return 5;
        }
        match cell {
            4 => 2,
            0 | 2 | 6 | 8 => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(3) {
            for cell in row {
                let symbol = match cell {
                    Some(Player::White) => 'x',
                    Some(Player::Black) => 'o',
                    None => '.',
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Counts lines that are still open for each player, weighting lines with
/// more marks higher.
#[must_use]
pub fn evaluate(game: &TicTacToe) -> Score {
    let mut score = 0;
    for line in &LINES {
        let ours = line
            .iter()
            .filter(|&&cell| game.cells[cell] == Some(game.to_move))
            .count() as i32;
        let theirs = line
            .iter()
            .filter(|&&cell| game.cells[cell] == Some(!game.to_move))
            .count() as i32;
        match (ours, theirs) {
            (0, 0) => {},
            (ours, 0) => score += ours * ours,
            (0, theirs) => score -= theirs * theirs,
            _ => {},
        }
    }
    Score::cp(score)
}
