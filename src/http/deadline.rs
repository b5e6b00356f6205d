//! Per-request body deadlines
//!
//! Read and write timeouts bound a single request, not the connection it
//! arrived on. The request body and the response body are each wrapped in a
//! `DeadlineBody` that fails once its instant has passed, which makes hyper
//! drop the exchange.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use hyper::body::{Body, Frame, SizeHint};
use tokio::time::{Instant, Sleep};

/// Deadline `secs` seconds after `started`, `None` when `secs` is 0
pub fn deadline_after(started: Instant, secs: u64) -> Option<Instant> {
    (secs > 0).then(|| started + Duration::from_secs(secs))
}

/// Body wrapper that errors with `TimedOut` once its deadline passes
pub struct DeadlineBody<B> {
    inner: B,
    sleep: Option<Pin<Box<Sleep>>>,
    /// `read` or `write`, for the error message
    direction: &'static str,
}

impl<B> DeadlineBody<B> {
    pub fn new(inner: B, deadline: Option<Instant>, direction: &'static str) -> Self {
        Self {
            inner,
            sleep: deadline.map(|at| Box::pin(tokio::time::sleep_until(at))),
            direction,
        }
    }
}

impl<B> Body for DeadlineBody<B>
where
    B: Body + Unpin,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Data = B::Data;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if let Some(sleep) = this.sleep.as_mut() {
            if sleep.as_mut().poll(cx).is_ready() {
                return Poll::Ready(Some(Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("{} timeout exceeded", this.direction),
                ))));
            }
        }
        Pin::new(&mut this.inner)
            .poll_frame(cx)
            .map(|frame| frame.map(|r| r.map_err(io::Error::other)))
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
