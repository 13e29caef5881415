//! quinn backend
//!
//! Concrete [`Session`](crate::Session), [`Stream`](crate::Stream) and
//! [`DatagramSocket`](crate::DatagramSocket) implementations over quinn.

pub mod session;
pub mod socket;
pub mod stream;

pub use session::QuicSession;
pub use socket::UdpSocket;
pub use stream::QuicStream;
