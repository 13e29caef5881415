//! Dialing a connection
//!
//! Binds a client socket, performs the QUIC handshake and opens the
//! connection's stream in one call.

use std::net::SocketAddr;

use crate::config::Config;
use crate::conn::Conn;
use crate::error::Result;
use crate::quic::{QuicSession, UdpSocket};

/// Connection over the quinn backend
pub type QuicConn = Conn<QuicSession, UdpSocket>;

/// Connect to `remote` and open one stream on the new session.
///
/// The returned connection owns the client socket; closing it tears down
/// the session as well.
///
/// # Errors
///
/// Returns an error if binding, the handshake or opening the stream fails.
pub async fn dial(
    remote: SocketAddr,
    server_name: &str,
    config: &Config,
    client: quinn::ClientConfig,
) -> Result<QuicConn> {
    let socket = UdpSocket::client_for(remote, config, client)?;
    let session = socket.connect(remote, server_name).await?;
    Ok(Conn::new(session, Some(socket)).await?)
}
