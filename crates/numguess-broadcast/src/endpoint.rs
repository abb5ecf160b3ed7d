//! TCP publish endpoint for external observers.
//!
//! Any process may connect and will receive every event published after
//! it attached, one JSON object per line. Subscribers never send anything;
//! whatever they write is ignored.

use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::{BroadcastError, BroadcastEvent, Publisher};

/// Accepts subscribers and streams events to them.
pub struct PublishEndpoint {
    listener: TcpListener,
    publisher: Publisher,
}

impl PublishEndpoint {
    /// Binds the endpoint; events come from `publisher`.
    pub async fn bind(
        addr: &str,
        publisher: Publisher,
    ) -> Result<Self, BroadcastError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(BroadcastError::Bind)?;
        tracing::info!(addr, "broadcast endpoint listening");
        Ok(Self {
            listener,
            publisher,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the endpoint on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Accept loop. Runs until the task is dropped.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    // Subscribe before spawning so nothing published
                    // in between is missed.
                    let rx = self.publisher.subscribe();
                    tracing::debug!(%addr, "broadcast subscriber attached");
                    tokio::spawn(serve_subscriber(stream, addr, rx));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "broadcast accept failed");
                }
            }
        }
    }
}

async fn serve_subscriber(
    mut stream: TcpStream,
    addr: SocketAddr,
    mut rx: broadcast::Receiver<BroadcastEvent>,
) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(%addr, skipped, "broadcast subscriber lagging");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let mut line = match serde_json::to_vec(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode broadcast event");
                continue;
            }
        };
        line.push(b'\n');

        if let Err(e) = stream.write_all(&line).await {
            tracing::debug!(%addr, error = %e, "broadcast subscriber gone");
            break;
        }
    }
}
