//! Setup error types
//!
//! Binding sockets, building TLS configuration and completing handshakes
//! report [`Error`]. The connection adapter itself never wraps errors: its
//! I/O returns the stream's or socket's `io::Error` as-is.

/// A Result alias where the Err case is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failures while preparing a session or its socket
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection setup failed: {0}")]
    Connect(#[from] quinn::ConnectError),
    #[error("Connection failed: {0}")]
    Connection(#[from] quinn::ConnectionError),
    #[error("TLS configuration failed: {0}")]
    Tls(#[from] rustls::Error),
    #[error("TLS provider has no QUIC initial cipher suite: {0}")]
    CipherSuite(#[from] quinn::crypto::rustls::NoInitialCipherSuite),
    #[error("Certificate generation failed: {0}")]
    Certificate(#[from] rcgen::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Endpoint closed")]
    EndpointClosed,
}
