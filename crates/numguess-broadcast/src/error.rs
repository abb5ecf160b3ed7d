/// Errors that can occur while setting up the broadcast side-channel.
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    /// The publish endpoint could not bind its listening socket.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),
}
