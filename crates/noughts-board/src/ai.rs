//! Computer opponents.
//!
//! Anything that can pick a move implements [`MoveSupplier`]. The network
//! server never calls these; they back [`LocalGame`](crate::LocalGame) and
//! any bot client that wants to play over the wire.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::{Board, Outcome, Player, Position};

/// Picks a move for `player` on `board`.
///
/// Returns `None` when the board has no empty cell.
pub trait MoveSupplier {
    fn choose(&mut self, board: &Board, player: Player) -> Option<Position>;
}

/// Always takes the lowest empty index. Deterministic; handy in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstAvailable;

impl MoveSupplier for FirstAvailable {
    fn choose(&mut self, board: &Board, _player: Player) -> Option<Position> {
        board.empty_positions().next()
    }
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// How hard an [`Opponent`] tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    /// Uniformly random empty cell.
    Easy,
    /// Takes wins and blocks losses most of the time.
    #[default]
    Medium,
    /// Exhaustive minimax. Never loses.
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

// ---------------------------------------------------------------------------
// Opponent
// ---------------------------------------------------------------------------

/// Chance that a medium opponent ignores tactics and plays at random.
const MEDIUM_BLUNDER_RATE: f64 = 0.2;

/// A computer player with a fixed [`Difficulty`].
#[derive(Debug, Clone)]
pub struct Opponent {
    difficulty: Difficulty,
    rng: StdRng,
}

impl Opponent {
    /// Creates an opponent seeded from the operating system.
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates an opponent with a fixed seed for reproducible play.
    pub fn with_seed(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn random_of(&mut self, positions: &[Position]) -> Option<Position> {
        positions.choose(&mut self.rng).copied()
    }

    fn medium(&mut self, board: &Board, player: Player) -> Option<Position> {
        let empty: Vec<Position> = board.empty_positions().collect();

        if self.rng.random_bool(MEDIUM_BLUNDER_RATE) {
            return self.random_of(&empty);
        }

        if let Some(win) = completing_move(board, &empty, player) {
            return Some(win);
        }
        if let Some(block) = completing_move(board, &empty, player.other()) {
            return Some(block);
        }
        if empty.contains(&Position::CENTER) {
            return Some(Position::CENTER);
        }

        let corners: Vec<Position> = Position::CORNERS
            .into_iter()
            .filter(|p| empty.contains(p))
            .collect();
        if let Some(corner) = self.random_of(&corners) {
            return Some(corner);
        }

        let sides: Vec<Position> = Position::SIDES
            .into_iter()
            .filter(|p| empty.contains(p))
            .collect();
        if let Some(side) = self.random_of(&sides) {
            return Some(side);
        }

        self.random_of(&empty)
    }
}

impl MoveSupplier for Opponent {
    fn choose(&mut self, board: &Board, player: Player) -> Option<Position> {
        match self.difficulty {
            Difficulty::Easy => {
                let empty: Vec<Position> = board.empty_positions().collect();
                self.random_of(&empty)
            }
            Difficulty::Medium => self.medium(board, player),
            Difficulty::Hard => best_move(board, player),
        }
    }
}

/// The first empty position that completes a line for `player`.
fn completing_move(
    board: &Board,
    empty: &[Position],
    player: Player,
) -> Option<Position> {
    empty.iter().copied().find(|&position| {
        board
            .with_move(player, position)
            .is_ok_and(|next| next.winner() == Some(Outcome::Winner(player)))
    })
}

// ---------------------------------------------------------------------------
// Minimax
// ---------------------------------------------------------------------------

/// Full-depth minimax. Ties go to the lowest index.
pub fn best_move(board: &Board, player: Player) -> Option<Position> {
    let mut best: Option<(i32, Position)> = None;

    for position in board.empty_positions() {
        let Ok(next) = board.with_move(player, position) else {
            continue;
        };
        let score = minimax(&next, 0, false, player);
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, position));
        }
    }

    best.map(|(_, position)| position)
}

/// Scores `board` from `me`'s point of view. Faster wins and slower losses
/// score higher.
fn minimax(board: &Board, depth: i32, maximizing: bool, me: Player) -> i32 {
    match board.winner() {
        Some(Outcome::Winner(p)) if p == me => return 10 - depth,
        Some(Outcome::Winner(_)) => return depth - 10,
        Some(Outcome::Draw) => return 0,
        None => {}
    }

    let mover = if maximizing { me } else { me.other() };
    let scores = board.empty_positions().filter_map(|position| {
        board
            .with_move(mover, position)
            .ok()
            .map(|next| minimax(&next, depth + 1, !maximizing, me))
    });

    if maximizing {
        scores.max().unwrap_or(0)
    } else {
        scores.min().unwrap_or(0)
    }
}
