//! Integration tests for sessions, the shared room, and the full TLS flow.

use std::sync::Arc;
use std::time::Duration;

use numguess::prelude::*;
use numguess::transport::{build_server_config, connect, LineConnection};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

// =========================================================================
// Helpers
// =========================================================================

fn state_with(targets: impl IntoIterator<Item = i64>) -> Arc<ServerState> {
    Arc::new(ServerState::new(
        GameConfig::default(),
        Arc::new(ScriptedTargets::new(targets)),
        Publisher::default(),
    ))
}

/// The client end of an in-memory session.
struct Player<C: Connection> {
    conn: C,
}

impl<C: Connection> Player<C> {
    async fn send(&self, json: &str) {
        self.conn.send(json.as_bytes()).await.expect("send");
    }

    /// Next `Info` text from the server.
    async fn read(&self) -> String {
        let data = timeout(WAIT, self.conn.recv())
            .await
            .expect("server should answer in time")
            .expect("recv")
            .expect("connection should be open");
        let value: serde_json::Value = serde_json::from_slice(&data).expect("json");
        value["message"].as_str().expect("message field").to_string()
    }

    async fn expect_closed(&self) {
        let next = timeout(WAIT, self.conn.recv()).await.expect("close in time");
        assert!(matches!(next, Ok(None)), "expected clean close, got {next:?}");
    }

    /// Reads the mode prompt and picks `mode`, returning the welcome text.
    async fn choose(&self, mode: &str) -> String {
        assert!(self.read().await.starts_with("Choose game mode"));
        self.send(&format!(r#"{{"mode":"{mode}"}}"#)).await;
        self.read().await
    }

    async fn guess(&self, value: i64) -> String {
        self.send(&format!(r#"{{"guess":{value}}}"#)).await;
        self.read().await
    }
}

fn start(state: &Arc<ServerState>) -> (Player<LineConnection<DuplexStream>>, JoinHandle<()>) {
    let (client, server) = tokio::io::duplex(4096);
    let session = tokio::spawn(serve_connection(
        LineConnection::new(server),
        Arc::clone(state),
    ));
    (
        Player {
            conn: LineConnection::new(client),
        },
        session,
    )
}

async fn wait_for_roster(state: &ServerState, size: usize) {
    for _ in 0..200 {
        if state.rooms().snapshot().await.members.len() == size {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("roster never reached {size}");
}

// =========================================================================
// Single player
// =========================================================================

#[tokio::test]
async fn test_single_player_hints_then_win() {
    let state = state_with([7]);
    let (player, _session) = start(&state);

    let welcome = player.choose("1").await;
    assert!(welcome.contains("5 attempts"));

    assert!(player.guess(5).await.contains("too small"));
    assert!(player.guess(9).await.contains("too high"));
    assert_eq!(player.guess(7).await, "Congratulations, you did it!");
    assert!(player.read().await.starts_with("Choose game mode"));
}

#[tokio::test]
async fn test_single_player_exhaustion() {
    let state = state_with([3]);
    let (player, _session) = start(&state);
    player.choose("1").await;

    for value in [1, 2, 4, 5] {
        assert!(player.guess(value).await.starts_with("Hint"));
    }
    assert_eq!(
        player.guess(6).await,
        "Sorry, you've used all of your attempts!"
    );
    assert!(player.read().await.starts_with("Choose game mode"));
}

#[tokio::test]
async fn test_unparsable_and_out_of_range_guesses_are_free() {
    let state = state_with([3]);
    let (player, _session) = start(&state);
    player.choose("1").await;

    player.send(r#"{"guess":"abc"}"#).await;
    assert!(player.read().await.starts_with("Invalid input!"));
    assert!(player.guess(0).await.starts_with("Choose a number between 1 to 10"));
    assert!(player.guess(11).await.starts_with("Choose a number between 1 to 10"));

    // Still five real attempts left.
    for value in [1, 2, 4, 5] {
        assert!(player.guess(value).await.starts_with("Hint"));
    }
    assert!(player.guess(6).await.starts_with("Sorry"));
}

#[tokio::test]
async fn test_string_guess_is_accepted() {
    let state = state_with([7]);
    let (player, _session) = start(&state);
    player.choose("1").await;

    player.send(r#"{"guess":" 7 "}"#).await;
    assert_eq!(player.read().await, "Congratulations, you did it!");
}

#[tokio::test]
async fn test_exit_abandons_single_player_round() {
    let state = state_with([7, 2]);
    let (player, _session) = start(&state);
    player.choose("1").await;
    player.guess(1).await;

    player.send(r#"{"exit":"exit"}"#).await;
    // A new round draws a new target.
    player.choose("1").await;
    assert_eq!(player.guess(2).await, "Congratulations, you did it!");
}

// =========================================================================
// Mode selection
// =========================================================================

#[tokio::test]
async fn test_garbage_at_menu_reprompts() {
    let state = state_with([7]);
    let (player, _session) = start(&state);
    assert!(player.read().await.starts_with("Choose game mode"));

    player.send("not json").await;
    assert!(player.read().await.starts_with("Unknown game mode"));
    assert!(player.read().await.starts_with("Choose game mode"));

    player.send(r#"{"mode":"3"}"#).await;
    assert!(player.read().await.starts_with("Unknown game mode"));

    let welcome = player.choose("1").await;
    assert!(welcome.starts_with("You have a total of"));
}

#[tokio::test]
async fn test_exit_at_menu_closes_connection() {
    let state = state_with([7]);
    let (player, session) = start(&state);
    assert!(player.read().await.starts_with("Choose game mode"));

    player.send(r#"{"mode":"EXIT"}"#).await;
    player.expect_closed().await;
    timeout(WAIT, session).await.expect("session ends").unwrap();
}

#[tokio::test]
async fn test_coalesced_frames_are_split() {
    let state = state_with([7]);
    let (mut client, server) = tokio::io::duplex(4096);
    let _session = tokio::spawn(serve_connection(LineConnection::new(server), state));

    client
        .write_all(b"{\"mode\":\"1\"}\n{\"guess\":5}\r\n{\"gue")
        .await
        .unwrap();
    client.write_all(b"ss\":7}\n").await.unwrap();

    let mut lines = BufReader::new(client).lines();
    let mut texts = Vec::new();
    for _ in 0..5 {
        let line = timeout(WAIT, lines.next_line()).await.unwrap().unwrap().unwrap();
        let info: Info = serde_json::from_str(&line).unwrap();
        texts.push(info.text);
    }
    assert!(texts[0].starts_with("Choose game mode"));
    assert!(texts[1].starts_with("You have a total of"));
    assert!(texts[2].contains("too small"));
    assert_eq!(texts[3], "Congratulations, you did it!");
    assert!(texts[4].starts_with("Choose game mode"));
}

// =========================================================================
// Multiplayer
// =========================================================================

#[tokio::test]
async fn test_multiplayer_winner_and_bystander() {
    let state = state_with([4, 9]);
    let (alice, _a) = start(&state);
    let (bob, _b) = start(&state);

    assert!(alice.choose("2").await.starts_with("Multi player game started"));
    assert!(bob.choose("2").await.starts_with("Multi player game started"));
    wait_for_roster(&state, 2).await;

    assert!(alice.guess(4).await.starts_with("Congratulations, you did it! Starting a new game"));
    assert!(bob.read().await.starts_with("Congratulations, someone guessed"));

    let snap = state.rooms().snapshot().await;
    assert_eq!(snap.target, Some(9));
    assert!(snap.members.iter().all(|(_, r)| *r == 5));
}

#[tokio::test]
async fn test_multiplayer_everyone_exhausted() {
    let state = state_with([4, 9]);
    let (alice, _a) = start(&state);
    let (bob, _b) = start(&state);
    alice.choose("2").await;
    bob.choose("2").await;
    wait_for_roster(&state, 2).await;

    for value in [1, 2, 3, 5] {
        assert!(alice.guess(value).await.starts_with("Hint"));
    }
    assert!(alice.guess(6).await.starts_with("Sorry"));
    for value in [10, 9, 8, 7] {
        assert!(bob.guess(value).await.starts_with("Hint"));
    }
    bob.send(r#"{"guess":6}"#).await;

    let for_alice = alice.read().await;
    let for_bob = bob.read().await;
    assert!(for_alice.starts_with("Everyone has used all of their attempts"));
    assert_eq!(for_alice, for_bob);

    let snap = state.rooms().snapshot().await;
    assert_eq!(snap.target, Some(9));
    assert!(snap.members.iter().all(|(_, r)| *r == 5));
}

#[tokio::test]
async fn test_disconnect_leaves_room() {
    let state = state_with([4]);
    let (alice, alice_session) = start(&state);
    let (bob, _b) = start(&state);
    alice.choose("2").await;
    bob.choose("2").await;
    wait_for_roster(&state, 2).await;

    drop(alice);
    timeout(WAIT, alice_session).await.expect("session ends").unwrap();

    let snap = state.rooms().snapshot().await;
    assert!(snap.active);
    assert_eq!(snap.members.len(), 1);
    assert!(bob.guess(1).await.contains("too small"));

    bob.send(r#"{"exit":"exit"}"#).await;
    assert!(bob.read().await.starts_with("Choose game mode"));
    let snap = state.rooms().snapshot().await;
    assert!(!snap.active);
    assert_eq!(snap.target, None);
}

#[tokio::test]
async fn test_last_member_disconnect_closes_room() {
    let state = state_with([4, 8]);
    let (alice, alice_session) = start(&state);
    alice.choose("2").await;
    wait_for_roster(&state, 1).await;
    assert_eq!(state.rooms().snapshot().await.target, Some(4));

    drop(alice);
    timeout(WAIT, alice_session).await.expect("session ends").unwrap();

    let snap = state.rooms().snapshot().await;
    assert!(!snap.active);
    assert_eq!(snap.target, None);
    assert!(snap.members.is_empty());

    let (bob, _b) = start(&state);
    bob.choose("2").await;
    wait_for_roster(&state, 1).await;
    assert!(bob.guess(8).await.starts_with("Congratulations, you did it!"));
}

#[tokio::test]
async fn test_bad_input_in_multiplayer_is_free() {
    let state = state_with([4]);
    let (alice, _a) = start(&state);
    alice.choose("2").await;
    wait_for_roster(&state, 1).await;

    alice.send(r#"{"guess":"four"}"#).await;
    assert!(alice.read().await.starts_with("Invalid input!"));
    assert!(alice.guess(42).await.starts_with("Choose a number between"));

    let snap = state.rooms().snapshot().await;
    assert_eq!(snap.members[0].1, 5);
}

// =========================================================================
// TLS end to end
// =========================================================================

fn tls_pair() -> (Arc<rustls::ServerConfig>, Arc<ClientConfig>) {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
            .expect("generate cert");
    let der: CertificateDer<'static> = cert.der().clone();
    let server = build_server_config(
        vec![der.clone()],
        PrivateKeyDer::Pkcs8(key_pair.serialize_der().into()),
    )
    .expect("server config");

    let mut roots = RootCertStore::empty();
    roots.add(der).expect("add root");
    let client = Arc::new(
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    );
    (server, client)
}

#[tokio::test]
async fn test_tls_multiplayer_round_is_broadcast() {
    let (server_tls, client_tls) = tls_pair();
    let server = GuessServer::builder()
        .bind("127.0.0.1:0")
        .tls_config(server_tls)
        .broadcast("127.0.0.1:0")
        .targets(Arc::new(ScriptedTargets::new([7, 2])))
        .build()
        .await
        .expect("server should start");
    let addr = server.local_addr().unwrap().to_string();
    let broadcast_addr = server.broadcast_addr().expect("broadcast endpoint");
    let state = Arc::clone(server.state());
    tokio::spawn(server.run());

    let observer = TcpStream::connect(broadcast_addr).await.unwrap();
    for _ in 0..200 {
        if state.publisher().subscriber_count() >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let player = Player {
        conn: connect(&addr, "localhost", client_tls).await.expect("connect"),
    };
    player.choose("2").await;
    assert!(player.guess(3).await.contains("too small"));
    assert!(player.guess(7).await.starts_with("Congratulations, you did it!"));

    let mut lines = BufReader::new(observer).lines();
    let mut seen = Vec::new();
    while !seen.contains(&BroadcastEvent::RoundWon { round: 1, target: 7 }) {
        let line = timeout(WAIT, lines.next_line())
            .await
            .expect("event in time")
            .unwrap()
            .expect("endpoint open");
        seen.push(serde_json::from_str::<BroadcastEvent>(&line).unwrap());
    }
    assert!(seen.contains(&BroadcastEvent::RoomOpened { round: 1 }));
    assert!(seen.contains(&BroadcastEvent::PlayerJoined { roster_size: 1 }));

    player.send(r#"{"exit":"exit"}"#).await;
    assert!(player.read().await.starts_with("Choose game mode"));
    player.send(r#"{"mode":"exit"}"#).await;
    player.expect_closed().await;
}

#[tokio::test]
async fn test_build_without_tls_fails() {
    let result = GuessServer::builder().bind("127.0.0.1:0").build().await;
    assert!(matches!(result, Err(NumguessError::MissingTlsConfig)));
}

#[tokio::test]
async fn test_build_rejects_empty_range() {
    let (server_tls, _) = tls_pair();
    let result = GuessServer::builder()
        .bind("127.0.0.1:0")
        .tls_config(server_tls)
        .game_config(GameConfig {
            low: 10,
            high: 1,
            max_attempts: 5,
        })
        .build()
        .await;
    assert!(matches!(result, Err(NumguessError::InvalidGameConfig(_))));
}

#[tokio::test]
async fn test_build_rejects_zero_attempts() {
    let (server_tls, _) = tls_pair();
    let result = GuessServer::builder()
        .bind("127.0.0.1:0")
        .tls_config(server_tls)
        .game_config(GameConfig {
            max_attempts: 0,
            ..GameConfig::default()
        })
        .build()
        .await;
    assert!(matches!(result, Err(NumguessError::InvalidGameConfig(_))));
}
