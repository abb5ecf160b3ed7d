//! numguess server binary.

use std::path::PathBuf;

use clap::Parser;
use numguess::prelude::*;
use tracing_subscriber::EnvFilter;

/// TLS number-guessing game server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Game port
    #[clap(short, long, default_value = "65432")]
    port: u16,

    /// PEM certificate chain presented to clients
    #[clap(long, default_value = "server.crt")]
    cert: PathBuf,

    /// PEM private key matching `--cert`
    #[clap(long, default_value = "server.key")]
    key: PathBuf,

    /// Port of the broadcast endpoint
    #[clap(long, default_value_t = DEFAULT_BROADCAST_PORT)]
    broadcast_port: u16,

    /// Do not open the broadcast endpoint
    #[clap(long)]
    no_broadcast: bool,
}

#[tokio::main]
async fn main() -> Result<(), NumguessError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let tls = load_server_config(&args.cert, &args.key)?;

    let mut builder = GuessServer::builder()
        .bind(&format!("{}:{}", args.host, args.port))
        .tls_config(tls);
    if !args.no_broadcast {
        builder = builder.broadcast(&format!("{}:{}", args.host, args.broadcast_port));
    }

    let server = match builder.build().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            return Err(e);
        }
    };
    if let Some(addr) = server.broadcast_addr() {
        tracing::info!(%addr, "broadcast endpoint listening");
    }
    server.run().await
}
