//! Integration tests for the server, handler, and full connection flow.
//!
//! Every test binds a real server on an OS-assigned port and talks to it
//! over TCP, either through `Client` or through a raw socket when the exact
//! bytes matter.

use std::collections::HashSet;
use std::time::Duration;

use noughts::prelude::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

const TIMEOUT: Duration = Duration::from_secs(2);

// =========================================================================
// Helpers
// =========================================================================

/// Starts a server on a random port and returns its address and handle.
async fn start_server(builder: ServerBuilder) -> (String, ServerHandle) {
    let server = builder
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let handle = server.handle();

    tokio::spawn(async move {
        let _ = server.run().await;
    });
    (addr, handle)
}

async fn recv(client: &mut Client) -> ServerMessage {
    timeout(TIMEOUT, client.recv())
        .await
        .expect("timed out waiting for message")
        .expect("recv should succeed")
        .expect("connection should stay open")
}

/// Connects and consumes the welcome.
async fn connect(addr: &str) -> Client {
    let mut client = Client::connect(addr).await.expect("should connect");
    let welcome = recv(&mut client).await;
    assert!(matches!(welcome, ServerMessage::Welcome { .. }));
    client
}

/// Connects two clients and pairs them. Returns (player one, player two).
async fn pair(addr: &str) -> (Client, Client) {
    let mut one = connect(addr).await;
    one.join().await.unwrap();
    assert_eq!(recv(&mut one).await, ServerMessage::Waiting);

    let mut two = connect(addr).await;
    two.join().await.unwrap();

    let start_one = recv(&mut one).await;
    let start_two = recv(&mut two).await;
    assert!(matches!(start_one, ServerMessage::GameStart { player: Player::One, .. }));
    assert!(matches!(start_two, ServerMessage::GameStart { player: Player::Two, .. }));
    assert_eq!(one.session_id(), two.session_id());
    (one, two)
}

/// Plays alternating moves, starting with `one`, and checks that both
/// clients see every `update`.
async fn play(one: &mut Client, two: &mut Client, moves: &[i64]) {
    for (turn, &position) in moves.iter().enumerate() {
        let mover = if turn % 2 == 0 { &mut *one } else { &mut *two };
        mover.make_move(position).await.unwrap();

        for client in [&mut *one, &mut *two] {
            let msg = recv(client).await;
            assert!(
                matches!(msg, ServerMessage::Update { .. }),
                "expected update, got {msg:?}"
            );
        }
    }
}

/// Raw socket that reads whole lines, for tests that need exact bytes.
struct RawClient {
    lines: tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl RawClient {
    async fn connect(addr: &str) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read).lines(),
            writer,
        }
    }

    async fn send(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    async fn recv(&mut self) -> serde_json::Value {
        let line = timeout(TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for line")
            .unwrap()
            .expect("connection should stay open");
        serde_json::from_str(&line).unwrap()
    }
}

// =========================================================================
// Connection flow
// =========================================================================

#[tokio::test]
async fn test_welcome_is_first_message() {
    let (addr, _) = start_server(ServerBuilder::new()).await;
    let mut raw = RawClient::connect(&addr).await;

    let welcome = raw.recv().await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["message"], "Connected to Tic Tac Toe server");
}

#[tokio::test]
async fn test_custom_welcome_message() {
    let (addr, _) =
        start_server(ServerBuilder::new().welcome_message("hello there")).await;
    let mut client = Client::connect(&addr).await.unwrap();

    assert_eq!(
        recv(&mut client).await,
        ServerMessage::Welcome { message: "hello there".into() }
    );
}

#[tokio::test]
async fn test_join_pairs_consecutive_clients() {
    let (addr, handle) = start_server(ServerBuilder::new()).await;
    let (one, two) = pair(&addr).await;

    assert_eq!(one.game_state(), Some(&GameState::initial()));
    assert!(one.is_my_turn());
    assert!(!two.is_my_turn());
    assert_eq!(handle.session_count().await, 1);
}

#[tokio::test]
async fn test_auto_join_pairs_without_join_message() {
    let (addr, _) = start_server(ServerBuilder::new().auto_join(true)).await;

    let mut one = connect(&addr).await;
    assert_eq!(recv(&mut one).await, ServerMessage::Waiting);
    let mut two = connect(&addr).await;

    assert!(matches!(recv(&mut two).await, ServerMessage::GameStart { player: Player::Two, .. }));
    assert!(matches!(recv(&mut one).await, ServerMessage::GameStart { player: Player::One, .. }));
}

#[tokio::test]
async fn test_joining_twice_is_an_error() {
    let (addr, _) = start_server(ServerBuilder::new()).await;
    let mut one = connect(&addr).await;
    one.join().await.unwrap();
    assert_eq!(recv(&mut one).await, ServerMessage::Waiting);

    one.join().await.unwrap();
    assert!(matches!(recv(&mut one).await, ServerMessage::Error { .. }));
}

// =========================================================================
// Games
// =========================================================================

#[tokio::test]
async fn test_top_row_win_sends_update_then_game_end() {
    let (addr, _) = start_server(ServerBuilder::new()).await;
    let (mut one, mut two) = pair(&addr).await;

    play(&mut one, &mut two, &[0, 3, 1, 4]).await;
    one.make_move(2).await.unwrap();

    for client in [&mut one, &mut two] {
        let update = recv(client).await;
        let ServerMessage::Update { game_state } = update else {
            panic!("expected update, got {update:?}");
        };
        assert!(!game_state.game_active);

        let end = recv(client).await;
        assert_eq!(
            end,
            ServerMessage::GameEnd {
                winner: Outcome::Winner(Player::One),
                game_state,
            }
        );
    }
}

#[tokio::test]
async fn test_draw_reports_code_three() {
    let (addr, _) = start_server(ServerBuilder::new()).await;
    let (mut one, mut two) = pair(&addr).await;

    // X O X / X O O / O X X
    play(&mut one, &mut two, &[0, 1, 2, 4, 3, 5, 7, 6]).await;
    one.make_move(8).await.unwrap();

    let mut game_end = None;
    for client in [&mut one, &mut two] {
        assert!(matches!(recv(client).await, ServerMessage::Update { .. }));
        game_end = Some(recv(client).await);
    }
    let Some(ServerMessage::GameEnd { winner, game_state }) = game_end else {
        panic!("expected game_end");
    };
    assert_eq!(winner, Outcome::Draw);
    assert_eq!(u8::from(winner), 3);
    assert!(game_state.board.is_full());
}

#[tokio::test]
async fn test_move_out_of_turn_is_invalid() {
    let (addr, _) = start_server(ServerBuilder::new()).await;
    let (_one, mut two) = pair(&addr).await;

    two.make_move(0).await.unwrap();
    assert_eq!(
        recv(&mut two).await,
        ServerMessage::Error { message: "Invalid move".into() }
    );
}

#[tokio::test]
async fn test_outsider_cannot_move_in_session() {
    let (addr, _) = start_server(ServerBuilder::new()).await;
    let (one, _two) = pair(&addr).await;
    let session_id = one.session_id().unwrap();

    let mut raw = RawClient::connect(&addr).await;
    raw.recv().await;
    raw.send(b"{\"type\":\"join\"}\n").await;
    assert_eq!(raw.recv().await["type"], "waiting");

    let line = format!(
        "{{\"type\":\"move\",\"session_id\":{},\"player\":2,\"position\":0}}\n",
        session_id.0
    );
    raw.send(line.as_bytes()).await;
    let reply = raw.recv().await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["message"], "Not your turn or not in this session");
}

#[tokio::test]
async fn test_unknown_session_gets_error_reply() {
    let (addr, _) = start_server(ServerBuilder::new()).await;
    let mut raw = RawClient::connect(&addr).await;
    raw.recv().await;

    raw.send(b"{\"type\":\"move\",\"session_id\":424242,\"player\":1,\"position\":0}\n")
        .await;
    let reply = raw.recv().await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["message"], "Unknown session");

    raw.send(b"{\"type\":\"restart\",\"session_id\":424242}\n").await;
    assert_eq!(raw.recv().await["type"], "error");
}

#[tokio::test]
async fn test_restart_after_game_end_is_broadcast() {
    let (addr, _) = start_server(ServerBuilder::new()).await;
    let (mut one, mut two) = pair(&addr).await;

    play(&mut one, &mut two, &[0, 3, 1, 4, 2]).await;
    for client in [&mut one, &mut two] {
        assert!(matches!(recv(client).await, ServerMessage::GameEnd { .. }));
    }

    two.restart().await.unwrap();
    for client in [&mut one, &mut two] {
        assert_eq!(
            recv(client).await,
            ServerMessage::GameRestart { game_state: GameState::initial() }
        );
    }
    assert!(one.is_my_turn());

    // The new game is playable.
    one.make_move(4).await.unwrap();
    assert!(matches!(recv(&mut two).await, ServerMessage::Update { .. }));
}

#[tokio::test]
async fn test_restart_mid_game_is_rejected() {
    let (addr, _) = start_server(ServerBuilder::new()).await;
    let (mut one, mut two) = pair(&addr).await;

    play(&mut one, &mut two, &[4]).await;
    one.restart().await.unwrap();
    assert_eq!(
        recv(&mut one).await,
        ServerMessage::Error { message: "Game is still in progress".into() }
    );
}

// =========================================================================
// Robustness
// =========================================================================

#[tokio::test]
async fn test_malformed_lines_are_ignored() {
    let (addr, _) = start_server(ServerBuilder::new().max_frame_length(64)).await;
    let mut raw = RawClient::connect(&addr).await;
    raw.recv().await;

    raw.send(b"this is not json\n").await;
    raw.send(b"{\"type\":\"dance\"}\n").await;
    raw.send(b"\n").await;
    raw.send(format!("{}\n", "x".repeat(200)).as_bytes()).await;
    raw.send(b"{\"type\":\"join\"}\r\n").await;

    // Only the join produces a reply.
    assert_eq!(raw.recv().await["type"], "waiting");
}

#[tokio::test]
async fn test_disconnect_notifies_opponent() {
    let (addr, handle) = start_server(ServerBuilder::new()).await;
    let (one, mut two) = pair(&addr).await;

    one.close().await.unwrap();

    assert_eq!(recv(&mut two).await, ServerMessage::OpponentDisconnected);
    assert_eq!(two.session_id(), None);

    // The session is gone; the survivor can queue again.
    assert_eq!(handle.session_count().await, 0);
    two.join().await.unwrap();
    assert_eq!(recv(&mut two).await, ServerMessage::Waiting);
}

#[tokio::test]
async fn test_waiting_client_that_leaves_is_not_paired() {
    let (addr, handle) = start_server(ServerBuilder::new()).await;

    let mut gone = connect(&addr).await;
    gone.join().await.unwrap();
    assert_eq!(recv(&mut gone).await, ServerMessage::Waiting);
    assert!(handle.has_waiter().await);
    gone.close().await.unwrap();

    timeout(TIMEOUT, async {
        while handle.has_waiter().await {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("server should drop the waiter after EOF");

    let mut next = connect(&addr).await;
    next.join().await.unwrap();
    assert_eq!(recv(&mut next).await, ServerMessage::Waiting);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_pair_everyone_once() {
    const CLIENTS: usize = 40;
    let (addr, handle) = start_server(ServerBuilder::new()).await;

    let mut tasks = Vec::with_capacity(CLIENTS);
    for _ in 0..CLIENTS {
        let addr = addr.clone();
        tasks.push(tokio::spawn(async move {
            let mut client = connect(&addr).await;
            client.join().await.unwrap();
            loop {
                match recv(&mut client).await {
                    ServerMessage::Waiting => continue,
                    ServerMessage::GameStart { session_id, player, .. } => {
                        // Hold the connection until every seat is counted.
                        return (session_id, player, client);
                    }
                    other => panic!("unexpected message: {other:?}"),
                }
            }
        }));
    }

    let mut seats = HashSet::new();
    let mut sessions = HashSet::new();
    let mut clients = Vec::with_capacity(CLIENTS);
    for task in tasks {
        let (session_id, player, client) =
            timeout(TIMEOUT * 5, task).await.unwrap().unwrap();
        assert!(seats.insert((session_id, player)), "seat handed out twice");
        sessions.insert(session_id);
        clients.push(client);
    }

    assert_eq!(seats.len(), CLIENTS);
    assert_eq!(sessions.len(), CLIENTS / 2);
    assert_eq!(handle.session_count().await, CLIENTS / 2);
    assert!(!handle.has_waiter().await);
}

#[tokio::test]
async fn test_send_to_reaches_one_seat() {
    let (addr, handle) = start_server(ServerBuilder::new()).await;
    let (one, mut two) = pair(&addr).await;

    let note = ServerMessage::Error { message: "server notice".into() };
    handle
        .send_to(one.session_id().unwrap(), Player::Two, note.clone())
        .await
        .unwrap();
    assert_eq!(recv(&mut two).await, note);
}

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let server = ServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(server.run_until(async {
        let _ = stop_rx.await;
    }));

    let mut client = connect(&addr).await;
    stop_tx.send(()).unwrap();

    let closed = timeout(TIMEOUT, client.recv()).await.unwrap().unwrap();
    assert_eq!(closed, None);
    timeout(TIMEOUT, running).await.unwrap().unwrap().unwrap();

    assert!(TcpStream::connect(&addr).await.is_err());
}
