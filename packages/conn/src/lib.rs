//! # quick
//!
//! A single QUIC stream exposed through the familiar socket contract.
//!
//! [`Conn`] opens one bidirectional stream on an established session and
//! forwards everything to the right collaborator:
//!
//! - **read / write** go to the stream (also via `AsyncRead` / `AsyncWrite`)
//! - **local_addr / remote_addr** come from the session
//! - **deadlines and buffer sizes** go to the datagram socket
//! - **close** finishes the stream, then closes the socket
//!
//! Errors from these calls are the underlying ones, unchanged. The QUIC
//! protocol itself (handshake, loss recovery, flow control, encryption) is
//! quinn's business.
//!
//! ## Usage
//!
//! ```no_run
//! use quick::{Config, dial, tls};
//! use tokio::io::AsyncWriteExt;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let client = tls::client_config(&config, tls::webpki_roots())?;
//! let mut conn = dial("192.0.2.1:4433".parse()?, "example.com", &config, client).await?;
//!
//! conn.write_all(b"hello").await?;
//! conn.close()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod conn;
pub mod deadline;
pub mod dial;
pub mod error;
pub mod quic;
pub mod tls;
pub mod transport;

pub use config::Config;
pub use conn::Conn;
pub use deadline::Deadline;
pub use dial::{QuicConn, dial};
pub use error::{Error, Result};
pub use quic::{QuicSession, QuicStream, UdpSocket};
pub use transport::{DatagramSocket, Session, Stream, UNSPECIFIED_ADDR};
