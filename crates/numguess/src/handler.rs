//! Per-connection session: mode selection, the single-player round and
//! the multiplayer round.
//!
//! Each session runs as two tasks. The reader (this module's state
//! machine) consumes client frames; a writer task drains the
//! connection's [`Outbox`] and is the only code that ever sends on the
//! connection. Room notices produced by other sessions arrive through the
//! same outbox, so lines from different sources never interleave.

use std::sync::Arc;

use numguess_protocol::{decode_client_message, ClientMessage, Codec, Info, Mode};
use numguess_room::{
    GameConfig, Hint, MemberId, Notice, Outbox, SingleOutcome, SinglePlayerGame,
};
use numguess_transport::{Connection, ConnectionId};
use tokio::sync::mpsc;

use crate::server::ServerState;

/// Where control goes once a round is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    /// Back to the mode prompt.
    Menu,
    /// The client left or the connection failed.
    Close,
}

/// Drop guard for a room membership.
///
/// `release` leaves the room and waits for it. If the guard is dropped
/// without being released (the session task was cancelled or panicked)
/// the leave is spawned instead. Since `Drop` is synchronous, that leave
/// is fire-and-forget.
struct Membership {
    id: MemberId,
    state: Arc<ServerState>,
    released: bool,
}

impl Membership {
    async fn join(state: Arc<ServerState>, outbox: Outbox) -> Self {
        let id = state.rooms.join(outbox).await;
        Self {
            id,
            state,
            released: false,
        }
    }

    fn id(&self) -> MemberId {
        self.id
    }

    async fn release(mut self) {
        // The coordinator logs a failed leave itself.
        let _ = self.state.rooms.leave(self.id).await;
        self.released = true;
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let id = self.id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let _ = state.rooms.leave(id).await;
        });
    }
}

/// Serves one connection from the first prompt until it closes.
///
/// Never returns an error: every failure is logged and ends this session
/// only. The connection is shut down once all queued notices are written.
pub async fn serve_connection<C: Connection>(conn: C, state: Arc<ServerState>) {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::info!(%conn_id, "session started");

    let (outbox, queue) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_notices(
        Arc::clone(&conn),
        queue,
        Arc::clone(&state),
    ));

    Session {
        conn: &*conn,
        conn_id,
        state,
        outbox,
    }
    .run()
    .await;

    // The session's outbox is gone now; the writer stops once the queue
    // is empty.
    if let Err(e) = writer.await {
        tracing::error!(%conn_id, error = %e, "writer task failed");
    }
    tracing::info!(%conn_id, "session closed");
}

/// Writes every queued notice as one `Info` line, then shuts the
/// connection down.
async fn write_notices<C: Connection>(
    conn: Arc<C>,
    mut queue: mpsc::UnboundedReceiver<Notice>,
    state: Arc<ServerState>,
) {
    let conn_id = conn.id();
    while let Some(notice) = queue.recv().await {
        let info = Info::new(notice.render(&state.config));
        let bytes = match state.codec.encode(&info) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "failed to encode notice");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::warn!(%conn_id, error = %e, "send failed");
            return;
        }
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
}

struct Session<'a, C> {
    conn: &'a C,
    conn_id: ConnectionId,
    state: Arc<ServerState>,
    outbox: Outbox,
}

impl<C: Connection> Session<'_, C> {
    async fn run(self) {
        loop {
            self.notify(Notice::ModePrompt);
            let Some(message) = self.next_message().await else {
                return;
            };

            let mode = match message {
                ClientMessage::ModeSelect { mode } => Mode::parse(&mode),
                other => {
                    tracing::debug!(conn_id = %self.conn_id, message = ?other, "expected a mode");
                    self.notify(Notice::UnknownMode);
                    continue;
                }
            };

            let next = match mode {
                Mode::SinglePlayer => self.single_player().await,
                Mode::Multiplayer => self.multiplayer().await,
                Mode::Exit => {
                    tracing::info!(conn_id = %self.conn_id, "client exited");
                    return;
                }
                Mode::Unknown(selection) => {
                    tracing::debug!(conn_id = %self.conn_id, %selection, "unknown mode");
                    self.notify(Notice::UnknownMode);
                    Next::Menu
                }
            };
            if next == Next::Close {
                return;
            }
        }
    }

    async fn single_player(&self) -> Next {
        let config = self.config();
        let mut game = SinglePlayerGame::start(config, self.state.targets.as_ref());
        tracing::debug!(conn_id = %self.conn_id, "single-player round started");
        self.notify(Notice::SingleWelcome);

        loop {
            let Some(message) = self.next_message().await else {
                return Next::Close;
            };
            let value = match message {
                ClientMessage::Exit => {
                    tracing::debug!(
                        conn_id = %self.conn_id,
                        attempts = game.attempts(),
                        "single-player round abandoned"
                    );
                    return Next::Menu;
                }
                ClientMessage::Guess { value } => value,
                other => {
                    tracing::debug!(conn_id = %self.conn_id, message = ?other, "expected a guess");
                    self.notify(Notice::InvalidInput);
                    continue;
                }
            };
            let Some(value) = value.as_number() else {
                self.notify(Notice::InvalidInput);
                continue;
            };

            match game.guess(value) {
                SingleOutcome::OutOfRange => self.notify(Notice::OutOfRange),
                SingleOutcome::Hint(hint) => self.notify(Notice::Hint(hint)),
                SingleOutcome::Won => {
                    tracing::info!(
                        conn_id = %self.conn_id,
                        attempts = game.attempts(),
                        "single-player round won"
                    );
                    self.notify(Notice::Hint(Hint::Correct));
                    return Next::Menu;
                }
                SingleOutcome::Exhausted => {
                    tracing::info!(
                        conn_id = %self.conn_id,
                        target = game.target(),
                        "single-player round exhausted"
                    );
                    self.notify(Notice::Exhausted);
                    return Next::Menu;
                }
            }
        }
    }

    async fn multiplayer(&self) -> Next {
        self.notify(Notice::MultiWelcome);
        let member = Membership::join(Arc::clone(&self.state), self.outbox.clone()).await;
        tracing::debug!(conn_id = %self.conn_id, member = %member.id(), "joined shared room");

        loop {
            let Some(message) = self.next_message().await else {
                member.release().await;
                return Next::Close;
            };
            let value = match message {
                ClientMessage::Exit => {
                    member.release().await;
                    return Next::Menu;
                }
                ClientMessage::Guess { value } => value,
                other => {
                    tracing::debug!(conn_id = %self.conn_id, message = ?other, "expected a guess");
                    self.notify(Notice::InvalidInput);
                    continue;
                }
            };
            let Some(value) = value.as_number() else {
                self.notify(Notice::InvalidInput);
                continue;
            };

            if let Err(e) = self.state.rooms.guess(member.id(), value).await {
                tracing::debug!(conn_id = %self.conn_id, error = %e, "guess dropped");
            }
        }
    }

    /// Reads and decodes the next frame. `None` means the session is over.
    async fn next_message(&self) -> Option<ClientMessage> {
        match self.conn.recv().await {
            Ok(Some(data)) => Some(decode_client_message(&self.state.codec, &data)),
            Ok(None) => {
                tracing::info!(conn_id = %self.conn_id, "client disconnected");
                None
            }
            Err(e) => {
                tracing::warn!(conn_id = %self.conn_id, error = %e, "receive failed");
                None
            }
        }
    }

    /// Queues a notice for this connection's writer.
    fn notify(&self, notice: Notice) {
        if self.outbox.send(notice).is_err() {
            tracing::debug!(conn_id = %self.conn_id, ?notice, "writer gone, notice dropped");
        }
    }

    fn config(&self) -> GameConfig {
        self.state.config
    }
}
