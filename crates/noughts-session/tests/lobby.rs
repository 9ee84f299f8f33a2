//! Integration tests for matchmaking and session cleanup through the
//! public `Lobby` API.

use noughts_protocol::{GameState, Outcome, Player, ServerMessage, SessionId};
use noughts_session::{Departure, JoinOutcome, Lobby, Participant, PlayerSender};
use noughts_transport::ConnectionId;
use tokio::sync::mpsc;

/// A fake connection: the participant handle the lobby keeps, plus the
/// handler's end of its outbox.
struct Client {
    participant: Participant,
    tx: Option<PlayerSender>,
    rx: mpsc::UnboundedReceiver<ServerMessage>,
}

fn client(id: u64) -> Client {
    let (tx, rx) = mpsc::unbounded_channel();
    Client {
        participant: Participant::new(ConnectionId::new(id), &tx),
        tx: Some(tx),
        rx,
    }
}

impl Client {
    fn id(&self) -> ConnectionId {
        self.participant.id()
    }

    fn messages(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn session_id(&mut self) -> Option<SessionId> {
        self.messages().into_iter().find_map(|msg| match msg {
            ServerMessage::GameStart { session_id, .. } => Some(session_id),
            _ => None,
        })
    }

    /// Drops the handler's sender, as a closed connection would.
    fn hang_up(&mut self) {
        self.tx = None;
    }
}

#[test]
fn joins_pair_in_arrival_order() {
    let mut lobby = Lobby::new();
    let mut clients: Vec<Client> = (1..=5).map(client).collect();

    let outcomes: Vec<JoinOutcome> = clients
        .iter()
        .map(|c| lobby.join(c.participant.clone()).unwrap())
        .collect();

    assert_eq!(outcomes[0], JoinOutcome::Waiting);
    assert!(matches!(outcomes[1], JoinOutcome::Paired { player: Player::Two, .. }));
    assert_eq!(outcomes[2], JoinOutcome::Waiting);
    assert!(matches!(outcomes[3], JoinOutcome::Paired { player: Player::Two, .. }));
    assert_eq!(outcomes[4], JoinOutcome::Waiting);

    let ids: Vec<Option<SessionId>> =
        clients.iter_mut().map(Client::session_id).collect();
    assert_eq!(ids[0], ids[1]);
    assert_eq!(ids[2], ids[3]);
    assert_ne!(ids[0], ids[2]);
    assert!(ids[0].is_some() && ids[2].is_some());
    assert_eq!(ids[4], None);

    assert_eq!(lobby.session_count(), 2);
    assert!(lobby.is_waiting(clients[4].id()));
}

#[test]
fn hung_up_waiter_is_not_paired() {
    let mut lobby = Lobby::new();
    let mut a = client(1);
    let mut b = client(2);

    lobby.join(a.participant.clone()).unwrap();
    a.hang_up();

    assert_eq!(lobby.join(b.participant.clone()), Ok(JoinOutcome::Waiting));
    assert_eq!(b.messages(), vec![ServerMessage::Waiting]);
    assert_eq!(lobby.session_count(), 0);
}

#[test]
fn disconnect_cleanup_happens_once_from_either_side() {
    let mut lobby = Lobby::new();
    let mut a = client(1);
    let mut b = client(2);
    lobby.join(a.participant.clone()).unwrap();
    lobby.join(b.participant.clone()).unwrap();
    let id = b.session_id().unwrap();
    a.messages();

    // Both sides observe the loss at roughly the same time.
    b.hang_up();
    let first = lobby.disconnect(b.id());
    let second = lobby.disconnect(a.id());

    assert_eq!(first, Departure::LeftSession { session_id: id, notified: true });
    assert_eq!(second, Departure::Unknown);
    assert_eq!(a.messages(), vec![ServerMessage::OpponentDisconnected]);
    assert!(lobby.session(id).is_none());

    // The survivor can find a new game.
    assert_eq!(lobby.join(a.participant.clone()), Ok(JoinOutcome::Waiting));
}

#[test]
fn drawn_game_reports_three_and_stays_finished() {
    let mut lobby = Lobby::new();
    let mut a = client(1);
    let mut b = client(2);
    lobby.join(a.participant.clone()).unwrap();
    lobby.join(b.participant.clone()).unwrap();
    let id = b.session_id().unwrap();
    a.messages();

    // X O X / X O O / O X X
    let moves = [0, 1, 2, 4, 3, 5, 7, 6, 8];
    for (turn, position) in moves.into_iter().enumerate() {
        let (conn, player) = if turn % 2 == 0 { (a.id(), 1) } else { (b.id(), 2) };
        lobby.make_move(conn, id, player, position).unwrap();
    }

    let messages = a.messages();
    let Some(ServerMessage::GameEnd { winner, game_state }) = messages.last() else {
        panic!("expected game_end last, got {messages:?}");
    };
    assert_eq!(*winner, Outcome::Draw);
    assert_eq!(u8::from(*winner), 3);
    assert!(!game_state.game_active);
    assert_eq!(messages.len(), moves.len() + 1);
    assert_eq!(b.messages(), messages);

    assert!(lobby.make_move(b.id(), id, 2, 0).is_err());
    let session = lobby.session(id).unwrap();
    assert!(!session.is_active());
    assert!(session.board().is_full());
    assert_ne!(session.snapshot(), GameState::initial());
}
