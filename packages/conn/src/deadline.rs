//! Socket deadlines
//!
//! A [`Deadline`] is the shared cell a datagram socket keeps for one I/O
//! direction. The connection polls it through a [`Timer`] alongside the
//! stream, so a deadline in the past fails pending and future I/O with
//! [`io::ErrorKind::TimedOut`]. Changing the cell wakes the parked task.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll};

use futures::task::AtomicWaker;
use tokio::time::{Instant, Sleep};

/// Absolute point in time after which I/O in one direction fails.
///
/// `None` means no deadline.
#[derive(Debug, Default)]
pub struct Deadline {
    at: Mutex<Option<Instant>>,
    waker: AtomicWaker,
}

impl Deadline {
    /// Create a cell with no deadline set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current deadline, if any
    pub fn get(&self) -> Option<Instant> {
        *self.at.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the deadline and wake whoever is parked on it.
    pub fn set(&self, at: Option<Instant>) {
        *self.at.lock().unwrap_or_else(PoisonError::into_inner) = at;
        self.waker.wake();
    }

    /// Whether the deadline has passed as of `now`
    pub fn is_elapsed(&self, now: Instant) -> bool {
        self.get().is_some_and(|at| at <= now)
    }

    fn register(&self, cx: &Context<'_>) {
        self.waker.register(cx.waker());
    }
}

/// Per-direction sleep state owned by the connection.
#[derive(Debug, Default)]
pub(crate) struct Timer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Timer {
    /// Ready once `deadline` has elapsed. Pending while it is unset or in
    /// the future; the task is woken when either the timer fires or the
    /// deadline is changed.
    pub(crate) fn poll_elapsed(&mut self, deadline: &Deadline, cx: &mut Context<'_>) -> Poll<()> {
        // register before reading so a concurrent set() is never missed
        deadline.register(cx);

        let Some(at) = deadline.get() else {
            self.sleep = None;
            return Poll::Pending;
        };

        if at <= Instant::now() {
            return Poll::Ready(());
        }

        match self.sleep.as_mut() {
            Some(sleep) if sleep.deadline() == at => {}
            Some(sleep) => sleep.as_mut().reset(at),
            None => self.sleep = Some(Box::pin(tokio::time::sleep_until(at))),
        }

        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().poll(cx),
            None => Poll::Pending,
        }
    }
}

/// Error reported when a deadline cuts an operation short.
pub(crate) fn timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "i/o timeout")
}
