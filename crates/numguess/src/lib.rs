//! # numguess
//!
//! A TLS number-guessing game server. Every connection picks between a
//! private single-player round and one shared multiplayer room in which
//! all joined players chase the same hidden number.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use numguess::prelude::*;
//!
//! # async fn start() -> Result<(), NumguessError> {
//! let server = GuessServer::builder()
//!     .bind("127.0.0.1:65432")
//!     .tls_config(load_server_config("cert.pem", "key.pem")?)
//!     .broadcast("127.0.0.1:5557")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::NumguessError;
pub use handler::serve_connection;
pub use server::{
    GuessServer, GuessServerBuilder, ServerState, DEFAULT_BIND_ADDR, DEFAULT_BROADCAST_PORT,
};

pub use numguess_broadcast as broadcast;
pub use numguess_protocol as protocol;
pub use numguess_room as room;
pub use numguess_transport as transport;

pub mod prelude {
    pub use crate::{
        serve_connection, GuessServer, GuessServerBuilder, NumguessError, ServerState,
        DEFAULT_BIND_ADDR, DEFAULT_BROADCAST_PORT,
    };
    pub use numguess_broadcast::{BroadcastEvent, Publisher};
    pub use numguess_protocol::{ClientMessage, Info, JsonCodec};
    pub use numguess_room::{GameConfig, RandomTargets, ScriptedTargets, TargetSource};
    pub use numguess_transport::{load_client_config, load_server_config, Connection};
}
