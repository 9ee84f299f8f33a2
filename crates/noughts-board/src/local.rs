//! A single-process game against a [`MoveSupplier`].
//!
//! The human is always player one. Every mutating call returns the events
//! it produced, in order, so a front end can render them without
//! registering callbacks.

use crate::{BoardError, GameState, MoveSupplier, Outcome, Player, Position};

/// Something that happened during a local game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A fresh game began.
    Started(GameState),
    /// The game was reset after [`LocalGame::restart`].
    Restarted(GameState),
    /// A move was applied and play continues.
    Updated(GameState),
    /// A move ended the game.
    Ended { outcome: Outcome, state: GameState },
}

/// A human-versus-computer game.
#[derive(Debug)]
pub struct LocalGame<S> {
    state: GameState,
    ai: S,
}

impl<S: MoveSupplier> LocalGame<S> {
    /// The seat the human always plays.
    pub const HUMAN: Player = Player::One;

    pub fn new(ai: S) -> Self {
        Self {
            state: GameState::initial(),
            ai,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Resets to an empty board.
    pub fn start(&mut self) -> GameEvent {
        self.state = GameState::initial();
        tracing::debug!("local game started");
        GameEvent::Started(self.state)
    }

    /// Same as [`start`](Self::start), reported as a restart.
    pub fn restart(&mut self) -> GameEvent {
        self.start();
        GameEvent::Restarted(self.state)
    }

    /// Plays the human's move at `position`, then the computer's reply.
    ///
    /// # Errors
    /// Rejects the move, without changing state, if the game is over, it is
    /// not the human's turn, or the position is illegal.
    pub fn play(&mut self, position: i64) -> Result<Vec<GameEvent>, BoardError> {
        if !self.state.game_active {
            return Err(BoardError::GameOver);
        }
        if self.state.current_player != Self::HUMAN {
            return Err(BoardError::NotYourTurn);
        }
        let position = Position::try_from(position)?;

        let mut events = Vec::with_capacity(2);
        if let Some(end) = self.place(Self::HUMAN, position)? {
            events.push(end);
            return Ok(events);
        }
        events.push(GameEvent::Updated(self.state));

        let computer = Self::HUMAN.other();
        let Some(reply) = self.computer_reply(computer) else {
            tracing::warn!("computer found no legal move");
            return Ok(events);
        };
        match self.place(computer, reply) {
            Ok(Some(end)) => events.push(end),
            Ok(None) => events.push(GameEvent::Updated(self.state)),
            Err(e) => tracing::warn!(error = %e, "computer reply rejected"),
        }

        Ok(events)
    }

    /// Asks the supplier for a move, falling back to the first empty cell
    /// when its answer is not playable.
    ///
    /// A supplier that names an occupied cell must not leave the human's
    /// move committed with the computer's turn never taken.
    fn computer_reply(&mut self, computer: Player) -> Option<Position> {
        let board = &self.state.board;
        match self.ai.choose(board, computer) {
            Some(reply) if board.cell(reply).is_empty() => Some(reply),
            Some(reply) => {
                tracing::warn!(%reply, "computer chose an occupied cell");
                board.empty_positions().next()
            }
            None => board.empty_positions().next(),
        }
    }

    /// Applies one move. Returns the end event if it finished the game.
    fn place(
        &mut self,
        player: Player,
        position: Position,
    ) -> Result<Option<GameEvent>, BoardError> {
        self.state.board.apply(player, position)?;

        if let Some(outcome) = self.state.board.winner() {
            self.state.game_active = false;
            return Ok(Some(GameEvent::Ended {
                outcome,
                state: self.state,
            }));
        }

        self.state.current_player = player.other();
        Ok(None)
    }
}
