//! Transport and socket configuration
//!
//! [`Config`] tunes the quinn transport and the datagram socket used by
//! [`crate::UdpSocket`] and [`crate::dial`]. It can be built in code with
//! the `with_*` methods or deserialized, missing fields taking defaults.

use std::sync::Arc;
use std::time::Duration;

use quinn::{IdleTimeout, TransportConfig, VarInt};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Default ALPN protocol identifier
pub const DEFAULT_ALPN: &[u8] = b"quick";

/// QUIC transport and socket settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Close the connection after this long without activity
    pub max_idle_timeout: Option<Duration>,
    /// Send keep-alive packets at this interval
    pub keep_alive_interval: Option<Duration>,
    /// Bidirectional streams the peer may open concurrently
    pub max_concurrent_bidi_streams: u32,
    /// Per-stream receive window in bytes
    pub stream_receive_window: u32,
    /// Connection-wide receive window in bytes
    pub receive_window: u32,
    /// Connection-wide send window in bytes
    pub send_window: u64,
    /// `SO_RCVBUF` applied when the socket is bound
    pub socket_recv_buffer: Option<usize>,
    /// `SO_SNDBUF` applied when the socket is bound
    pub socket_send_buffer: Option<usize>,
    /// ALPN protocols offered or accepted during the handshake
    pub alpn_protocols: Vec<Vec<u8>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_idle_timeout: Some(Duration::from_secs(30)),
            keep_alive_interval: None,
            max_concurrent_bidi_streams: 100,
            stream_receive_window: 1_000_000,
            receive_window: 10_000_000,
            send_window: 10_000_000,
            socket_recv_buffer: None,
            socket_send_buffer: None,
            alpn_protocols: vec![DEFAULT_ALPN.to_vec()],
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_max_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.max_idle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_keep_alive_interval(mut self, interval: Option<Duration>) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_concurrent_bidi_streams(mut self, streams: u32) -> Self {
        self.max_concurrent_bidi_streams = streams;
        self
    }

    #[must_use]
    pub fn with_stream_receive_window(mut self, window_size: u32) -> Self {
        self.stream_receive_window = window_size;
        self
    }

    #[must_use]
    pub fn with_receive_window(mut self, window_size: u32) -> Self {
        self.receive_window = window_size;
        self
    }

    #[must_use]
    pub fn with_send_window(mut self, window_size: u64) -> Self {
        self.send_window = window_size;
        self
    }

    /// Set the kernel buffer sizes applied to the socket when it is bound.
    ///
    /// These are the datagram socket's buffers, not QUIC flow-control windows.
    #[must_use]
    pub fn with_socket_buffers(mut self, recv: Option<usize>, send: Option<usize>) -> Self {
        self.socket_recv_buffer = recv;
        self.socket_send_buffer = send;
        self
    }

    #[must_use]
    pub fn with_alpn_protocols(mut self, protocols: Vec<Vec<u8>>) -> Self {
        self.alpn_protocols = protocols;
        self
    }

    /// Build the quinn transport configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the idle timeout exceeds what QUIC can encode.
    pub fn transport(&self) -> Result<Arc<TransportConfig>> {
        let idle_timeout = self
            .max_idle_timeout
            .map(IdleTimeout::try_from)
            .transpose()
            .map_err(|e| Error::Config(format!("max_idle_timeout out of range: {e}")))?;

        let mut transport = TransportConfig::default();
        transport
            .max_idle_timeout(idle_timeout)
            .keep_alive_interval(self.keep_alive_interval)
            .max_concurrent_bidi_streams(VarInt::from_u32(self.max_concurrent_bidi_streams))
            .stream_receive_window(VarInt::from_u32(self.stream_receive_window))
            .receive_window(VarInt::from_u32(self.receive_window))
            .send_window(self.send_window);

        Ok(Arc::new(transport))
    }
}
