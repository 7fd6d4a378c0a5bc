//! Bounding futures by an optional cycle deadline.

use std::future::Future;
use std::pin::pin;

use futures_timer::Delay;
use futures_util::future::{Either, select};
use hcommon::Deadline;

/// Runs `future` to completion, or returns `None` once `deadline` passes.
/// Without a deadline the future is simply awaited.
pub(crate) async fn within_deadline<F>(future: F, deadline: Option<Deadline>) -> Option<F::Output>
where
    F: Future,
{
    let Some(deadline) = deadline else {
        return Some(future.await);
    };

    let remaining = deadline.remaining();
    if remaining.is_zero() {
        return None;
    }

    match select(pin!(future), Delay::new(remaining)).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    }
}
