//! Best-effort broadcast side-channel for numguess.
//!
//! A one-way fan-out of [`BroadcastEvent`]s to observers that are not
//! playing: there are no acknowledgements, no delivery guarantee and no
//! backpressure. Game code holds a [`Publisher`]; external processes attach
//! through a [`PublishEndpoint`].

mod endpoint;
mod error;
mod event;
mod publisher;

pub use endpoint::PublishEndpoint;
pub use error::BroadcastError;
pub use event::BroadcastEvent;
pub use publisher::{Publisher, DEFAULT_CAPACITY};
