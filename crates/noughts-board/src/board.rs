//! The 3×3 grid, its cells, and win/draw detection.
//!
//! Cells are addressed by a flat index `0..=8`, row-major:
//!
//! ```text
//!  0 | 1 | 2
//! ---+---+---
//!  3 | 4 | 5
//! ---+---+---
//!  6 | 7 | 8
//! ```
//!
//! On the wire every cell is a small integer: `0` empty, `1` player one,
//! `2` player two. The serde attributes below keep that shape.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BoardError;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One of the two seats in a game. Player one always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// The player whose turn comes after this one.
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// The wire number of this player (`1` or `2`).
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> Self {
        player.number()
    }
}

impl TryFrom<u8> for Player {
    type Error = BoardError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(BoardError::UnknownPlayer(other)),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "X"),
            Self::Two => write!(f, "O"),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// The content of one square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    #[default]
    Empty,
    Taken(Player),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => 0,
            Cell::Taken(player) => player.number(),
        }
    }
}

impl TryFrom<u8> for Cell {
    type Error = BoardError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Empty),
            other => Player::try_from(other).map(Self::Taken),
        }
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A validated cell index in `0..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position(u8);

impl Position {
    /// Every position in index order.
    pub const ALL: [Position; 9] = [
        Position(0),
        Position(1),
        Position(2),
        Position(3),
        Position(4),
        Position(5),
        Position(6),
        Position(7),
        Position(8),
    ];

    pub const CENTER: Position = Position(4);
    pub const CORNERS: [Position; 4] =
        [Position(0), Position(2), Position(6), Position(8)];
    pub const SIDES: [Position; 4] =
        [Position(1), Position(3), Position(5), Position(7)];

    /// Returns the position for `index`, or `None` if it is off the board.
    pub fn new(index: usize) -> Option<Self> {
        (index < 9).then_some(Self(index as u8))
    }

    /// The flat row-major index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<i64> for Position {
    type Error = BoardError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(BoardError::OutOfRange(value))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How a finished game ended.
///
/// Serialized as the legacy result code: `1` or `2` for the winning player,
/// `3` for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Outcome {
    Winner(Player),
    Draw,
}

/// Result code used on the wire for a drawn game.
pub const DRAW_CODE: u8 = 3;

impl From<Outcome> for u8 {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Winner(player) => player.number(),
            Outcome::Draw => DRAW_CODE,
        }
    }
}

impl TryFrom<u8> for Outcome {
    type Error = BoardError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            DRAW_CODE => Ok(Self::Draw),
            other => Player::try_from(other).map(Self::Winner),
        }
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Rows, then columns, then the two diagonals. [`Board::winner`] reports the
/// first line that matches in this order.
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

/// A tic-tac-toe grid.
///
/// `Board` is `Copy`: lookahead search takes a copy, plays speculative
/// moves on it, and never touches the caller's board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([Cell; 9]);

impl Board {
    /// An empty board.
    pub const fn new() -> Self {
        Self([Cell::Empty; 9])
    }

    /// Builds a board from wire codes (`0`, `1`, `2`).
    pub fn from_codes(codes: [u8; 9]) -> Result<Self, BoardError> {
        let mut cells = [Cell::Empty; 9];
        for (cell, code) in cells.iter_mut().zip(codes) {
            *cell = Cell::try_from(code)?;
        }
        Ok(Self(cells))
    }

    pub fn cell(&self, position: Position) -> Cell {
        self.0[position.index()]
    }

    pub fn cells(&self) -> &[Cell; 9] {
        &self.0
    }

    /// Marks `position` for `player`.
    ///
    /// # Errors
    /// [`BoardError::Occupied`] if the cell already holds a mark. The board
    /// is left untouched on error.
    pub fn apply(
        &mut self,
        player: Player,
        position: Position,
    ) -> Result<(), BoardError> {
        let cell = &mut self.0[position.index()];
        if !cell.is_empty() {
            return Err(BoardError::Occupied(position));
        }
        *cell = Cell::Taken(player);
        Ok(())
    }

    /// Returns a copy of this board with `player` at `position`.
    pub fn with_move(
        mut self,
        player: Player,
        position: Position,
    ) -> Result<Self, BoardError> {
        self.apply(player, position)?;
        Ok(self)
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        self.0 = [Cell::Empty; 9];
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(|cell| !cell.is_empty())
    }

    /// Number of non-empty cells.
    pub fn filled(&self) -> usize {
        self.0.iter().filter(|cell| !cell.is_empty()).count()
    }

    /// Empty positions in index order.
    pub fn empty_positions(&self) -> impl Iterator<Item = Position> + '_ {
        Position::ALL
            .into_iter()
            .filter(|position| self.cell(*position).is_empty())
    }

    /// Checks rows, columns and diagonals for three equal marks.
    ///
    /// Returns the first winning line's player, [`Outcome::Draw`] when no
    /// line matches and the board is full, and `None` while play continues.
    pub fn winner(&self) -> Option<Outcome> {
        for [a, b, c] in LINES {
            if let Cell::Taken(player) = self.0[a] {
                if self.0[b] == self.0[a] && self.0[c] == self.0[a] {
                    return Some(Outcome::Winner(player));
                }
            }
        }
        self.is_full().then_some(Outcome::Draw)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.0.chunks(3).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for cell in chunk {
                match cell {
                    Cell::Empty => write!(f, ".")?,
                    Cell::Taken(player) => write!(f, "{player}")?,
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The read-only projection of a game that clients render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub current_player: Player,
    pub game_active: bool,
}

impl GameState {
    /// Empty board, player one to move.
    pub fn initial() -> Self {
        Self {
            board: Board::new(),
            current_player: Player::One,
            game_active: true,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::initial()
    }
}
