//! UDP socket carrying quinn sessions
//!
//! [`UdpSocket`] binds a `std::net::UdpSocket`, keeps a `socket2` handle on
//! it for kernel buffer sizing, and hands the socket to a quinn endpoint.
//! Closing it closes the endpoint, which tears down every session on it,
//! and gives up the endpoint so the port is released once they drain and
//! their handles are dropped.

use std::io;
use std::net::{self, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Mutex, PoisonError};

use quinn::{Endpoint, EndpointConfig, VarInt};
use socket2::Socket;
use tokio::time::Instant;

use super::session::QuicSession;
use crate::config::Config;
use crate::deadline::Deadline;
use crate::error::{Error, Result};
use crate::transport::DatagramSocket;

/// Datagram socket owning a quinn endpoint
#[derive(Debug)]
pub struct UdpSocket {
    // None once closed
    open: Mutex<Option<Open>>,
    read_deadline: Deadline,
    write_deadline: Deadline,
}

#[derive(Debug)]
struct Open {
    endpoint: Endpoint,
    handle: Socket,
}

impl UdpSocket {
    /// Bind a client socket on `bind` using `client` for outgoing handshakes.
    ///
    /// # Errors
    ///
    /// Returns an error if binding or endpoint creation fails.
    pub fn client(bind: SocketAddr, config: &Config, client: quinn::ClientConfig) -> Result<Self> {
        Self::bind(bind, config, Some(client), None)
    }

    /// Bind a client socket on the unspecified address of the same family as `remote`.
    ///
    /// # Errors
    ///
    /// Returns an error if binding or endpoint creation fails.
    pub fn client_for(remote: SocketAddr, config: &Config, client: quinn::ClientConfig) -> Result<Self> {
        let bind = match remote {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        Self::client(bind, config, client)
    }

    /// Bind a server socket on `bind` accepting handshakes with `server`.
    ///
    /// # Errors
    ///
    /// Returns an error if binding or endpoint creation fails.
    pub fn server(bind: SocketAddr, config: &Config, server: quinn::ServerConfig) -> Result<Self> {
        Self::bind(bind, config, None, Some(server))
    }

    fn bind(
        bind: SocketAddr,
        config: &Config,
        client: Option<quinn::ClientConfig>,
        server: Option<quinn::ServerConfig>,
    ) -> Result<Self> {
        let socket = net::UdpSocket::bind(bind)?;
        let handle = Socket::from(socket.try_clone()?);

        if let Some(bytes) = config.socket_recv_buffer {
            handle.set_recv_buffer_size(bytes)?;
        }
        if let Some(bytes) = config.socket_send_buffer {
            handle.set_send_buffer_size(bytes)?;
        }

        let accepts = server.is_some();
        let runtime = quinn::default_runtime()
            .ok_or_else(|| io::Error::other("no async runtime found"))?;
        let mut endpoint = Endpoint::new(EndpointConfig::default(), server, socket, runtime)?;
        if let Some(client) = client {
            endpoint.set_default_client_config(client);
        }

        tracing::debug!(
            target: "quick::socket",
            local = %endpoint.local_addr()?,
            accepts,
            "Bound UDP socket"
        );

        Ok(Self {
            open: Mutex::new(Some(Open { endpoint, handle })),
            read_deadline: Deadline::new(),
            write_deadline: Deadline::new(),
        })
    }

    /// Address the socket is bound to
    ///
    /// # Errors
    ///
    /// Returns the OS error if the address cannot be queried, or an error
    /// once the socket is closed.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.endpoint()?.local_addr()
    }

    /// Handle to the quinn endpoint running over this socket
    ///
    /// # Errors
    ///
    /// Fails once the socket is closed.
    pub fn endpoint(&self) -> io::Result<Endpoint> {
        self.with_open(|open| Ok(open.endpoint.clone()))
    }

    /// Perform a handshake with `remote`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake cannot start or fails.
    pub async fn connect(&self, remote: SocketAddr, server_name: &str) -> Result<QuicSession> {
        let endpoint = self.endpoint()?;
        let connection = endpoint.connect(remote, server_name)?.await?;

        tracing::debug!(
            target: "quick::socket",
            remote = %remote,
            server_name,
            "Established QUIC session"
        );

        Ok(QuicSession::new(connection, endpoint.local_addr()?))
    }

    /// Wait for the next incoming session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EndpointClosed`] once the endpoint stops accepting,
    /// or the handshake error of the incoming session.
    pub async fn accept(&self) -> Result<QuicSession> {
        let endpoint = self.endpoint().map_err(|_| Error::EndpointClosed)?;
        let incoming = endpoint.accept().await.ok_or(Error::EndpointClosed)?;
        let connection = incoming.await?;

        tracing::debug!(
            target: "quick::socket",
            remote = %connection.remote_address(),
            "Accepted QUIC session"
        );

        Ok(QuicSession::new(connection, endpoint.local_addr()?))
    }

    /// Current `SO_RCVBUF` as reported by the kernel
    ///
    /// # Errors
    ///
    /// Fails once the socket is closed.
    pub fn read_buffer_size(&self) -> io::Result<usize> {
        self.with_open(|open| open.handle.recv_buffer_size())
    }

    /// Current `SO_SNDBUF` as reported by the kernel
    ///
    /// # Errors
    ///
    /// Fails once the socket is closed.
    pub fn write_buffer_size(&self) -> io::Result<usize> {
        self.with_open(|open| open.handle.send_buffer_size())
    }

    fn with_open<T>(&self, f: impl FnOnce(&Open) -> io::Result<T>) -> io::Result<T> {
        let guard = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(open) => f(open),
            None => Err(closed()),
        }
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "use of closed network connection")
}

impl DatagramSocket for UdpSocket {
    fn read_deadline(&self) -> &Deadline {
        &self.read_deadline
    }

    fn write_deadline(&self) -> &Deadline {
        &self.write_deadline
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.with_open(|_| Ok(()))?;
        self.read_deadline.set(deadline);
        Ok(())
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.with_open(|_| Ok(()))?;
        self.write_deadline.set(deadline);
        Ok(())
    }

    fn set_read_buffer(&self, bytes: usize) -> io::Result<()> {
        self.with_open(|open| open.handle.set_recv_buffer_size(bytes))
    }

    fn set_write_buffer(&self, bytes: usize) -> io::Result<()> {
        self.with_open(|open| open.handle.set_send_buffer_size(bytes))
    }

    /// Close the endpoint and every session on it, then drop this side's
    /// handles. quinn releases the port once the sessions have drained and
    /// no session handle is left.
    fn close(&self) -> io::Result<()> {
        let open = self
            .open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(closed)?;

        open.endpoint.close(VarInt::from_u32(0), b"");
        drop(open);

        tracing::debug!(target: "quick::socket", "Closed UDP socket");
        Ok(())
    }
}
