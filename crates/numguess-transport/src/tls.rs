//! TLS-over-TCP transport using `tokio-rustls`.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, RootCertStore, ServerConfig};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::{TlsAcceptor, TlsConnector};

use crate::{ConnectionId, Handshake, LineConnection, Transport, TransportError};

/// A server-side TLS connection framed as lines.
pub type TlsConnection =
    LineConnection<tokio_rustls::server::TlsStream<TcpStream>>;

/// A client-side TLS connection framed as lines.
pub type TlsClientConnection =
    LineConnection<tokio_rustls::client::TlsStream<TcpStream>>;

/// A TLS [`Transport`] that listens for incoming TCP connections.
pub struct TlsTransport {
    listener: TcpListener,
    acceptor: TlsAcceptor,
}

impl TlsTransport {
    /// Binds a new TLS transport to the given address.
    pub async fn bind(
        addr: &str,
        config: Arc<ServerConfig>,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TLS transport listening");
        Ok(Self {
            listener,
            acceptor: TlsAcceptor::from(config),
        })
    }
}

impl Transport for TlsTransport {
    type Pending = PendingTls;

    async fn accept(&mut self) -> Result<PendingTls, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let id = ConnectionId::next();
        tracing::debug!(%id, %addr, "accepted TCP connection");

        Ok(PendingTls {
            id,
            addr,
            stream,
            acceptor: self.acceptor.clone(),
        })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// An accepted TCP socket whose TLS handshake has not run yet.
pub struct PendingTls {
    id: ConnectionId,
    addr: SocketAddr,
    stream: TcpStream,
    acceptor: TlsAcceptor,
}

impl PendingTls {
    /// The ID the connection will carry once established.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Handshake for PendingTls {
    type Connection = TlsConnection;

    fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    async fn complete(self) -> Result<TlsConnection, TransportError> {
        let tls = self
            .acceptor
            .accept(self.stream)
            .await
            .map_err(TransportError::Handshake)?;
        tracing::debug!(id = %self.id, addr = %self.addr, "TLS handshake complete");
        Ok(LineConnection::with_id(self.id, tls))
    }
}

/// Connects to a TLS server and returns a line-framed connection.
///
/// `server_name` is checked against the certificate the server presents.
pub async fn connect(
    addr: &str,
    server_name: &str,
    config: Arc<ClientConfig>,
) -> Result<TlsClientConnection, TransportError> {
    let name = ServerName::try_from(server_name.to_string())
        .map_err(|e| TransportError::Tls(format!("server name: {e}")))?;
    let tcp = TcpStream::connect(addr)
        .await
        .map_err(TransportError::ConnectFailed)?;
    let tls = TlsConnector::from(config)
        .connect(name, tcp)
        .await
        .map_err(TransportError::Handshake)?;
    Ok(LineConnection::new(tls))
}

/// Builds a server config from an already parsed chain and key.
pub fn build_server_config(
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<Arc<ServerConfig>, TransportError> {
    if certs.is_empty() {
        return Err(TransportError::Tls("certificate chain empty".into()));
    }
    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| TransportError::Tls(format!("build server config: {e}")))?;
    Ok(Arc::new(config))
}

/// Loads a PEM certificate chain and private key into a server config.
pub fn load_server_config(
    cert_path: impl AsRef<Path>,
    key_path: impl AsRef<Path>,
) -> Result<Arc<ServerConfig>, TransportError> {
    let certs = read_certs(cert_path.as_ref())?;

    let key_path = key_path.as_ref();
    let key_pem = fs::read(key_path).map_err(|e| {
        TransportError::Tls(format!("read key '{}': {e}", key_path.display()))
    })?;
    let key = rustls_pemfile::private_key(&mut &key_pem[..])
        .map_err(|e| TransportError::Tls(format!("parse key: {e}")))?
        .ok_or_else(|| {
            TransportError::Tls(format!(
                "no private key found in '{}'",
                key_path.display()
            ))
        })?;

    let config = build_server_config(certs, key)?;
    tracing::info!(
        cert = %cert_path.as_ref().display(),
        key = %key_path.display(),
        "TLS server config loaded"
    );
    Ok(config)
}

/// Builds a client config that trusts the certificates in `ca_path`.
pub fn load_client_config(
    ca_path: impl AsRef<Path>,
) -> Result<Arc<ClientConfig>, TransportError> {
    let mut roots = RootCertStore::empty();
    for cert in read_certs(ca_path.as_ref())? {
        roots
            .add(cert)
            .map_err(|e| TransportError::Tls(format!("trust anchor: {e}")))?;
    }
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TransportError> {
    let pem = fs::read(path).map_err(|e| {
        TransportError::Tls(format!("read cert '{}': {e}", path.display()))
    })?;
    let certs = rustls_pemfile::certs(&mut &pem[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::Tls(format!("parse certs: {e}")))?;
    if certs.is_empty() {
        return Err(TransportError::Tls(format!(
            "no certificates in '{}'",
            path.display()
        )));
    }
    Ok(certs)
}
