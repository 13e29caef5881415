//! QUIC stream connection adapter
//!
//! [`Conn`] wraps one bidirectional stream opened on a session and exposes
//! it through the usual connection contract: read, write, addresses, close,
//! deadlines and socket buffer sizes. Every call is forwarded to the stream,
//! the session or the datagram socket; nothing is buffered or retried.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::time::Instant;

use crate::deadline::{Timer, timed_out};
use crate::transport::{DatagramSocket, Session, Stream};

/// A single QUIC stream behaving like a socket.
///
/// The socket is owned and closed by the connection. The session is only a
/// handle used for address queries and is never closed here. The stream is
/// owned exclusively; a second `Conn` on the same session opens its own.
pub struct Conn<S: Session, U> {
    socket: Option<U>,
    session: S,
    stream: Option<S::Stream>,
    read_timer: Timer,
    write_timer: Timer,
}

impl<S, U> Conn<S, U>
where
    S: Session,
    U: DatagramSocket,
{
    /// Open one stream on `session` and wrap it.
    ///
    /// Pass `None` for `socket` when something else owns the datagram
    /// socket, e.g. a second connection on a session whose socket already
    /// belongs to the first.
    ///
    /// There is no timeout on opening the stream: if the peer never grants
    /// stream credit this waits indefinitely. Bound it with
    /// `tokio::time::timeout` where that matters.
    ///
    /// # Errors
    ///
    /// Returns the session's stream-open error unchanged.
    pub async fn new(session: S, socket: Option<U>) -> Result<Self, S::Error> {
        let stream = session.open_stream().await?;

        tracing::debug!(
            target: "quick::conn",
            local = %session.local_addr(),
            remote = %session.remote_addr(),
            owns_socket = socket.is_some(),
            "Opened stream for connection"
        );

        Ok(Self::from_parts(session, socket, Some(stream)))
    }

    /// Wrap parts obtained elsewhere, such as a stream accepted from the peer.
    pub fn from_parts(session: S, socket: Option<U>, stream: Option<S::Stream>) -> Self {
        Self {
            socket,
            session,
            stream,
            read_timer: Timer::default(),
            write_timer: Timer::default(),
        }
    }

    /// Local network address reported by the session
    pub fn local_addr(&self) -> SocketAddr {
        self.session.local_addr()
    }

    /// Remote network address reported by the session
    pub fn remote_addr(&self) -> SocketAddr {
        self.session.remote_addr()
    }

    /// Session this connection's stream belongs to
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Underlying stream, if present
    pub fn stream(&self) -> Option<&S::Stream> {
        self.stream.as_ref()
    }

    /// Underlying datagram socket, if owned
    pub fn socket(&self) -> Option<&U> {
        self.socket.as_ref()
    }

    /// Close the stream, then the socket.
    ///
    /// A failure to close the stream is discarded so the socket is always
    /// released; the result is the socket's close result, or `Ok(())` when
    /// there is no socket.
    ///
    /// Closing the socket ends the session at once, so data written but not
    /// yet acknowledged may never reach the peer. Shut the stream down and
    /// wait for the peer first when delivery matters.
    ///
    /// # Errors
    ///
    /// Returns the socket's close error unchanged.
    pub fn close(&mut self) -> io::Result<()> {
        if let Some(stream) = self.stream.as_mut()
            && let Err(e) = stream.close()
        {
            tracing::warn!(
                target: "quick::conn",
                error = %e,
                "Stream close failed, closing socket anyway"
            );
        }

        match self.socket.as_ref() {
            Some(socket) => socket.close(),
            None => Ok(()),
        }
    }

    /// Set the read and write deadlines on the socket. `None` disables them.
    ///
    /// # Errors
    ///
    /// Returns the socket's error, or `NotConnected` without a socket.
    pub fn set_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.owned_socket()?.set_deadline(deadline)
    }

    /// Set the read deadline on the socket. `None` disables it.
    ///
    /// # Errors
    ///
    /// Returns the socket's error, or `NotConnected` without a socket.
    pub fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.owned_socket()?.set_read_deadline(deadline)
    }

    /// Set the write deadline on the socket. `None` disables it.
    ///
    /// # Errors
    ///
    /// Returns the socket's error, or `NotConnected` without a socket.
    pub fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.owned_socket()?.set_write_deadline(deadline)
    }

    /// Size of the operating system receive buffer of the socket.
    ///
    /// This does not change QUIC flow-control windows.
    ///
    /// # Errors
    ///
    /// Returns the socket's error, or `NotConnected` without a socket.
    pub fn set_read_buffer(&self, bytes: usize) -> io::Result<()> {
        self.owned_socket()?.set_read_buffer(bytes)
    }

    /// Size of the operating system send buffer of the socket.
    ///
    /// # Errors
    ///
    /// Returns the socket's error, or `NotConnected` without a socket.
    pub fn set_write_buffer(&self, bytes: usize) -> io::Result<()> {
        self.owned_socket()?.set_write_buffer(bytes)
    }

    fn owned_socket(&self) -> io::Result<&U> {
        self.socket.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "connection has no datagram socket")
        })
    }
}

impl<S, U> Conn<S, U>
where
    S: Session + Unpin,
    U: DatagramSocket + Unpin,
{
    /// Read from the stream. `Ok(0)` signals end of stream.
    ///
    /// # Errors
    ///
    /// Returns the stream's error, or `TimedOut` past the read deadline.
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        AsyncReadExt::read(self, buf).await
    }

    /// Write to the stream, returning how many bytes were accepted.
    ///
    /// # Errors
    ///
    /// Returns the stream's error, or `TimedOut` past the write deadline.
    pub async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        AsyncWriteExt::write(self, buf).await
    }
}

fn no_stream() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection has no stream")
}

impl<S, U> AsyncRead for Conn<S, U>
where
    S: Session + Unpin,
    U: DatagramSocket + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if let Some(socket) = this.socket.as_ref()
            && this.read_timer.poll_elapsed(socket.read_deadline(), cx).is_ready()
        {
            return Poll::Ready(Err(timed_out()));
        }

        match this.stream.as_mut() {
            Some(stream) => Pin::new(stream).poll_read(cx, buf),
            None => Poll::Ready(Err(no_stream())),
        }
    }
}

impl<S, U> AsyncWrite for Conn<S, U>
where
    S: Session + Unpin,
    U: DatagramSocket + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        if let Some(socket) = this.socket.as_ref()
            && this.write_timer.poll_elapsed(socket.write_deadline(), cx).is_ready()
        {
            return Poll::Ready(Err(timed_out()));
        }

        match this.stream.as_mut() {
            Some(stream) => Pin::new(stream).poll_write(cx, buf),
            None => Poll::Ready(Err(no_stream())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut().stream.as_mut() {
            Some(stream) => Pin::new(stream).poll_flush(cx),
            None => Poll::Ready(Err(no_stream())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut().stream.as_mut() {
            Some(stream) => Pin::new(stream).poll_shutdown(cx),
            None => Poll::Ready(Err(no_stream())),
        }
    }
}

impl<S, U> std::fmt::Debug for Conn<S, U>
where
    S: Session,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("quick::Conn")
            .field("local_addr", &self.session.local_addr())
            .field("remote_addr", &self.session.remote_addr())
            .field("has_stream", &self.stream.is_some())
            .field("owns_socket", &self.socket.is_some())
            .finish()
    }
}
