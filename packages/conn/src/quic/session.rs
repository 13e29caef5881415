//! quinn connection as a [`Session`]

use std::net::SocketAddr;

use quinn::{Connection, ConnectionError};

use super::stream::QuicStream;
use crate::transport::Session;

/// Handle to an established quinn connection.
///
/// Cloning yields another handle to the same connection. Dropping handles
/// never closes it explicitly; quinn closes a connection once every handle
/// is gone.
#[derive(Debug, Clone)]
pub struct QuicSession {
    connection: Connection,
    local_addr: SocketAddr,
}

impl QuicSession {
    /// Wrap `connection`, established on an endpoint bound to `local_addr`.
    pub fn new(connection: Connection, local_addr: SocketAddr) -> Self {
        Self {
            connection,
            local_addr,
        }
    }

    /// Underlying quinn connection
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Accept the next stream opened by the peer.
    ///
    /// A stream opened by the peer becomes visible only once the peer has
    /// written to it.
    ///
    /// # Errors
    ///
    /// Returns the connection error if the connection is lost.
    pub async fn accept_stream(&self) -> Result<QuicStream, ConnectionError> {
        let (send, recv) = self.connection.accept_bi().await?;
        Ok(QuicStream::new(send, recv))
    }
}

impl Session for QuicSession {
    type Stream = QuicStream;
    type Error = ConnectionError;

    async fn open_stream(&self) -> Result<QuicStream, ConnectionError> {
        let (send, recv) = self.connection.open_bi().await?;
        Ok(QuicStream::new(send, recv))
    }

    fn local_addr(&self) -> SocketAddr {
        match self.connection.local_ip() {
            Some(ip) => SocketAddr::new(ip, self.local_addr.port()),
            None => self.local_addr,
        }
    }

    fn remote_addr(&self) -> SocketAddr {
        self.connection.remote_address()
    }
}
