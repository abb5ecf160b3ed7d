/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Connecting to a remote server failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// The TLS handshake with a peer failed.
    #[error("tls handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    /// TLS material could not be loaded or assembled into a config.
    #[error("tls configuration: {0}")]
    Tls(String),

    /// The peer sent a line longer than the framing limit.
    #[error("frame exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },
}
