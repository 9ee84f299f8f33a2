//! One game between two participants.

use noughts_board::{Board, BoardError, GameState, Outcome, Player, Position};
use noughts_protocol::{ServerMessage, SessionId};
use noughts_transport::ConnectionId;

use crate::{Participant, SessionError};

/// Where a session is in its lifecycle.
///
/// ```text
/// AwaitingMove(One) ⇄ AwaitingMove(Two) → Finished(outcome)
///          ↑                                     │
///          └───────────── restart ───────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    AwaitingMove(Player),
    Finished(Outcome),
}

/// Result of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The game goes on with the other player to move.
    Continued(GameState),
    /// The move ended the game.
    Finished { outcome: Outcome, state: GameState },
}

impl MoveOutcome {
    pub fn state(&self) -> &GameState {
        match self {
            Self::Continued(state) | Self::Finished { state, .. } => state,
        }
    }
}

/// A board, whose turn it is, and the two seated participants.
///
/// All mutation goes through [`make_move`](Self::make_move) and
/// [`restart`](Self::restart).
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    board: Board,
    current_player: Player,
    outcome: Option<Outcome>,
    participants: [Participant; 2],
}

impl Session {
    /// Starts a fresh game. `first` plays as player one.
    pub fn new(id: SessionId, first: Participant, second: Participant) -> Self {
        Self {
            id,
            board: Board::new(),
            current_player: Player::One,
            outcome: None,
            participants: [first, second],
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_active(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn phase(&self) -> SessionPhase {
        match self.outcome {
            Some(outcome) => SessionPhase::Finished(outcome),
            None => SessionPhase::AwaitingMove(self.current_player),
        }
    }

    pub fn snapshot(&self) -> GameState {
        GameState {
            board: self.board,
            current_player: self.current_player,
            game_active: self.is_active(),
        }
    }

    pub fn participant(&self, player: Player) -> &Participant {
        match player {
            Player::One => &self.participants[0],
            Player::Two => &self.participants[1],
        }
    }

    /// Returns the seat a connection occupies, if any.
    pub fn seat_of(&self, id: ConnectionId) -> Option<Player> {
        if self.participants[0].id() == id {
            Some(Player::One)
        } else if self.participants[1].id() == id {
            Some(Player::Two)
        } else {
            None
        }
    }

    /// Validates and applies a move.
    ///
    /// # Errors
    /// [`SessionError::InvalidMove`] if the game is over, it is not
    /// `player`'s turn, or the board rejects `position`. Nothing changes
    /// on error.
    pub fn make_move(
        &mut self,
        player: Player,
        position: i64,
    ) -> Result<MoveOutcome, SessionError> {
        if !self.is_active() {
            return Err(SessionError::InvalidMove(BoardError::GameOver));
        }
        if player != self.current_player {
            return Err(SessionError::InvalidMove(BoardError::NotYourTurn));
        }
        let position =
            Position::try_from(position).map_err(SessionError::InvalidMove)?;
        self.board
            .apply(player, position)
            .map_err(SessionError::InvalidMove)?;

        match self.board.winner() {
            Some(outcome) => {
                self.outcome = Some(outcome);
                Ok(MoveOutcome::Finished {
                    outcome,
                    state: self.snapshot(),
                })
            }
            None => {
                self.current_player = self.current_player.other();
                Ok(MoveOutcome::Continued(self.snapshot()))
            }
        }
    }

    /// Clears the board for a new game with player one to move.
    ///
    /// # Errors
    /// [`SessionError::GameInProgress`] while the current game is active.
    pub fn restart(&mut self) -> Result<GameState, SessionError> {
        if self.is_active() {
            return Err(SessionError::GameInProgress);
        }
        self.board.clear();
        self.current_player = Player::One;
        self.outcome = None;
        Ok(self.snapshot())
    }

    /// Sends a message to one seat.
    pub fn send(
        &self,
        player: Player,
        msg: ServerMessage,
    ) -> Result<(), SessionError> {
        self.participant(player).send(msg)
    }

    /// Sends a message to both seats.
    ///
    /// A failed delivery is logged and does not stop delivery to the other
    /// seat. Returns how many participants were reached.
    pub fn broadcast(&self, msg: &ServerMessage) -> usize {
        let mut delivered = 0;
        for participant in &self.participants {
            match participant.send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(
                        session_id = %self.id,
                        conn_id = %participant.id(),
                        kind = msg.kind(),
                        error = %e,
                        "broadcast skipped departed participant"
                    );
                }
            }
        }
        delivered
    }
}
