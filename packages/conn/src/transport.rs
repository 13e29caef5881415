//! Transport seams
//!
//! The connection adapter is generic over three collaborators: the
//! multiplexed [`Session`] it opens its stream on, the bidirectional
//! [`Stream`] itself, and the [`DatagramSocket`] carrying the session.
//! The quinn-backed implementations live in [`crate::quic`].

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;

use crate::deadline::Deadline;

/// Address reported when a session has none
pub const UNSPECIFIED_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));

/// An established, multiplexed transport session.
///
/// Implementations are handles: cloning or holding one does not imply
/// responsibility for closing the session.
pub trait Session {
    /// Stream type produced by [`Session::open_stream`]
    type Stream: Stream;
    /// Failure to open a stream, returned to callers unchanged
    type Error;

    /// Open a new bidirectional stream.
    ///
    /// May suspend until the peer allows another stream. No timeout is
    /// applied; drop the future to cancel.
    fn open_stream(&self) -> impl Future<Output = Result<Self::Stream, Self::Error>> + Send;

    /// Local address of the session, [`UNSPECIFIED_ADDR`] when unknown
    fn local_addr(&self) -> SocketAddr;

    /// Remote address of the session
    fn remote_addr(&self) -> SocketAddr;
}

/// One bidirectional byte stream on a session.
pub trait Stream: AsyncRead + AsyncWrite + Unpin {
    /// Close the sending half of the stream.
    fn close(&mut self) -> io::Result<()>;
}

/// The datagram socket a session runs over.
///
/// Only configuration and teardown go through this trait; payload I/O goes
/// through the stream. Deadlines are stored here and consulted by the
/// connection on every read and write.
pub trait DatagramSocket {
    /// Deadline cell for reads
    fn read_deadline(&self) -> &Deadline;

    /// Deadline cell for writes
    fn write_deadline(&self) -> &Deadline;

    /// Set the read deadline. `None` disables it.
    fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()>;

    /// Set the write deadline. `None` disables it.
    fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()>;

    /// Set both deadlines. `None` disables them.
    fn set_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_read_deadline(deadline)?;
        self.set_write_deadline(deadline)
    }

    /// Size of the operating system receive buffer (`SO_RCVBUF`)
    fn set_read_buffer(&self, bytes: usize) -> io::Result<()>;

    /// Size of the operating system send buffer (`SO_SNDBUF`)
    fn set_write_buffer(&self, bytes: usize) -> io::Result<()>;

    /// Release the socket and everything running over it.
    fn close(&self) -> io::Result<()>;
}
