//! Interactive numguess client.
//!
//! Prints every message the server sends and turns each stdin line into a
//! frame: a `mode` while at the menu, a `guess` during a round. Typing
//! `exit` leaves the round, or the server when already at the menu.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use numguess::broadcast::BroadcastEvent;
use numguess::protocol::{ClientMessage, Codec, GuessValue, Info, JsonCodec, Mode};
use numguess::transport::{connect, load_client_config, Connection, TlsClientConnection};
use numguess::NumguessError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

/// Connect to the number guessing game server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// CA certificate the server certificate must chain to
    #[clap(short = 'a', value_name = "cafile")]
    cafile: PathBuf,

    /// Server host
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server game port
    #[clap(short, long, default_value = "65432")]
    port: u16,

    /// Name the server certificate must be issued for
    #[clap(long, default_value = "localhost")]
    server_name: String,

    /// Broadcast endpoint port, followed while in multiplayer
    #[clap(long, default_value_t = numguess::DEFAULT_BROADCAST_PORT)]
    broadcast_port: u16,
}

/// Menu text the server sends whenever a round is over.
const MENU_PREFIX: &str = "Choose game mode";

#[tokio::main]
async fn main() -> Result<(), NumguessError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let tls = load_client_config(&args.cafile)?;
    let addr = format!("{}:{}", args.host, args.port);
    let conn = Arc::new(connect(&addr, &args.server_name, tls).await?);
    tracing::info!(%addr, "TLS connection established");

    let in_round = Arc::new(AtomicBool::new(false));
    let printer = tokio::spawn(print_messages(Arc::clone(&conn), Arc::clone(&in_round)));

    let mut following = false;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        let at_menu = !in_round.load(Ordering::SeqCst);

        let message = if at_menu {
            match Mode::parse(&line) {
                Mode::SinglePlayer => in_round.store(true, Ordering::SeqCst),
                Mode::Multiplayer => {
                    in_round.store(true, Ordering::SeqCst);
                    if !following {
                        following = true;
                        let addr = format!("{}:{}", args.host, args.broadcast_port);
                        tokio::spawn(follow_broadcasts(addr));
                    }
                }
                Mode::Exit | Mode::Unknown(_) => {}
            }
            ClientMessage::ModeSelect { mode: line.clone() }
        } else if line.eq_ignore_ascii_case("exit") {
            in_round.store(false, Ordering::SeqCst);
            ClientMessage::Exit
        } else {
            ClientMessage::Guess {
                value: GuessValue::from(line.clone()),
            }
        };

        if let Some(frame) = message.to_frame() {
            let bytes = JsonCodec.encode(&frame)?;
            conn.send(&bytes).await?;
        }
        if at_menu && matches!(Mode::parse(&line), Mode::Exit) {
            break;
        }
    }

    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "close failed");
    }
    if let Err(e) = printer.await {
        tracing::error!(error = %e, "printer task failed");
    }
    Ok(())
}

/// Prints server messages until the connection closes.
async fn print_messages(conn: Arc<TlsClientConnection>, in_round: Arc<AtomicBool>) {
    loop {
        match conn.recv().await {
            Ok(Some(data)) => match JsonCodec.decode::<Info>(&data) {
                Ok(info) => {
                    if info.text.starts_with(MENU_PREFIX) {
                        in_round.store(false, Ordering::SeqCst);
                    }
                    println!("Server: {}", info.text);
                }
                Err(e) => tracing::warn!(error = %e, "unreadable server message"),
            },
            Ok(None) => {
                tracing::info!("server closed the connection");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "connection lost");
                return;
            }
        }
    }
}

/// Logs broadcast events for as long as the endpoint keeps talking.
async fn follow_broadcasts(addr: String) {
    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::debug!(%addr, error = %e, "broadcast endpoint unavailable");
            return;
        }
    };
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match serde_json::from_str::<BroadcastEvent>(&line) {
            Ok(event) => tracing::info!(?event, "broadcast"),
            Err(e) => tracing::debug!(error = %e, "unreadable broadcast"),
        }
    }
}
