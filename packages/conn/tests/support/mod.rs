//! In-memory doubles for the transport seams
//!
//! Streams are `tokio::io::duplex` pairs; the far end of every opened stream
//! is kept by the session so tests can play the peer. Sockets and streams
//! record the calls they receive in a shared log.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use quick::{DatagramSocket, Deadline, Session, Stream, UNSPECIFIED_ADDR};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tokio::time::Instant;

pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub fn calls(log: &CallLog) -> Vec<&'static str> {
    log.lock().expect("Call log lock should not be poisoned").clone()
}

fn record(log: &CallLog, call: &'static str) {
    log.lock().expect("Call log lock should not be poisoned").push(call);
}

pub struct MockStream {
    pub id: usize,
    io: DuplexStream,
    log: CallLog,
    close_error: Option<io::ErrorKind>,
}

impl Stream for MockStream {
    fn close(&mut self) -> io::Result<()> {
        record(&self.log, "stream.close");
        match self.close_error {
            Some(kind) => Err(io::Error::new(kind, "stream close failed")),
            None => Ok(()),
        }
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_read(cx, buf)
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.io).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_shutdown(cx)
    }
}

struct SessionState {
    opened: AtomicUsize,
    peers: Mutex<Vec<Option<DuplexStream>>>,
    open_error: Option<io::ErrorKind>,
    stream_close_error: Option<io::ErrorKind>,
    log: CallLog,
    local: Option<SocketAddr>,
    remote: Option<SocketAddr>,
}

#[derive(Clone)]
pub struct MockSession {
    state: Arc<SessionState>,
}

impl MockSession {
    pub fn new(log: &CallLog) -> Self {
        Self::build(log, None, None)
    }

    /// Session that reports no addresses, like one not yet bound
    pub fn without_addresses(log: &CallLog) -> Self {
        let session = Self::build(log, None, None);
        let state = Arc::into_inner(session.state).expect("Fresh session has one handle");
        Self {
            state: Arc::new(SessionState {
                local: None,
                remote: None,
                ..state
            }),
        }
    }

    pub fn failing(log: &CallLog, kind: io::ErrorKind) -> Self {
        Self::build(log, Some(kind), None)
    }

    pub fn with_failing_stream_close(log: &CallLog, kind: io::ErrorKind) -> Self {
        Self::build(log, None, Some(kind))
    }

    fn build(
        log: &CallLog,
        open_error: Option<io::ErrorKind>,
        stream_close_error: Option<io::ErrorKind>,
    ) -> Self {
        Self {
            state: Arc::new(SessionState {
                opened: AtomicUsize::new(0),
                peers: Mutex::new(Vec::new()),
                open_error,
                stream_close_error,
                log: Arc::clone(log),
                local: Some("10.0.0.1:5000".parse().expect("Static address should parse")),
                remote: Some("10.0.0.2:443".parse().expect("Static address should parse")),
            }),
        }
    }

    /// Number of stream-open requests received so far
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Take the peer end of the stream opened `index`-th
    pub fn take_peer(&self, index: usize) -> DuplexStream {
        self.state
            .peers
            .lock()
            .expect("Peer lock should not be poisoned")
            .get_mut(index)
            .and_then(Option::take)
            .expect("Peer stream should exist and not be taken yet")
    }

    pub fn expected_local(&self) -> Option<SocketAddr> {
        self.state.local
    }

    pub fn expected_remote(&self) -> Option<SocketAddr> {
        self.state.remote
    }
}

impl Session for MockSession {
    type Stream = MockStream;
    type Error = io::Error;

    async fn open_stream(&self) -> io::Result<MockStream> {
        let id = self.state.opened.fetch_add(1, Ordering::SeqCst);
        record(&self.state.log, "session.open_stream");

        if let Some(kind) = self.state.open_error {
            return Err(io::Error::new(kind, "too many open streams"));
        }

        let (local, peer) = tokio::io::duplex(64 * 1024);
        self.state
            .peers
            .lock()
            .expect("Peer lock should not be poisoned")
            .push(Some(peer));

        Ok(MockStream {
            id,
            io: local,
            log: Arc::clone(&self.state.log),
            close_error: self.state.stream_close_error,
        })
    }

    fn local_addr(&self) -> SocketAddr {
        self.state.local.unwrap_or(UNSPECIFIED_ADDR)
    }

    fn remote_addr(&self) -> SocketAddr {
        self.state.remote.unwrap_or(UNSPECIFIED_ADDR)
    }
}

pub struct MockSocket {
    log: CallLog,
    close_error: Option<io::ErrorKind>,
    pub read_deadline: Arc<Deadline>,
    pub write_deadline: Arc<Deadline>,
    pub buffers: Arc<Mutex<(Option<usize>, Option<usize>)>>,
}

impl MockSocket {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
            close_error: None,
            read_deadline: Arc::new(Deadline::new()),
            write_deadline: Arc::new(Deadline::new()),
            buffers: Arc::new(Mutex::new((None, None))),
        }
    }

    pub fn failing_close(log: &CallLog, kind: io::ErrorKind) -> Self {
        Self {
            close_error: Some(kind),
            ..Self::new(log)
        }
    }
}

impl DatagramSocket for MockSocket {
    fn read_deadline(&self) -> &Deadline {
        &self.read_deadline
    }

    fn write_deadline(&self) -> &Deadline {
        &self.write_deadline
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        record(&self.log, "socket.set_read_deadline");
        self.read_deadline.set(deadline);
        Ok(())
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        record(&self.log, "socket.set_write_deadline");
        self.write_deadline.set(deadline);
        Ok(())
    }

    fn set_read_buffer(&self, bytes: usize) -> io::Result<()> {
        record(&self.log, "socket.set_read_buffer");
        self.buffers.lock().expect("Buffer lock should not be poisoned").0 = Some(bytes);
        Ok(())
    }

    fn set_write_buffer(&self, bytes: usize) -> io::Result<()> {
        record(&self.log, "socket.set_write_buffer");
        self.buffers.lock().expect("Buffer lock should not be poisoned").1 = Some(bytes);
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        record(&self.log, "socket.close");
        match self.close_error {
            Some(kind) => Err(io::Error::new(kind, "socket close failed")),
            None => Ok(()),
        }
    }
}
