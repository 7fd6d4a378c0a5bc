//! Streaming response contracts and in-memory stream utilities.
//!
//! ```rust
//! use hprovider::{BoxedResponseStream, ModelResponse, ResponseMessage, VecResponseStream};
//!
//! let stream = VecResponseStream::new(vec![Ok(ModelResponse::from_message(
//!     ResponseMessage::text("hello"),
//! ))]);
//! let _boxed: BoxedResponseStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::StreamExt;

use crate::{ModelResponse, ProviderError, StreamAccumulator, StreamSnapshot};

/// Provider stream contract.
///
/// Invariants for consumers:
/// - Envelopes are emitted in source order.
/// - Each envelope may be partial; any field may be absent.
/// - An `Err` item or an envelope with a non-success status ends the call.
/// - Once the stream yields `None`, it must not yield additional items.
pub trait ResponseStream: Stream<Item = Result<ModelResponse, ProviderError>> + Send {}

impl<T> ResponseStream for T where T: Stream<Item = Result<ModelResponse, ProviderError>> + Send {}

pub type BoxedResponseStream<'a> = Pin<Box<dyn ResponseStream + 'a>>;

#[derive(Debug)]
pub struct VecResponseStream {
    increments: VecDeque<Result<ModelResponse, ProviderError>>,
}

impl VecResponseStream {
    pub fn new(increments: Vec<Result<ModelResponse, ProviderError>>) -> Self {
        Self {
            increments: increments.into(),
        }
    }
}

impl Stream for VecResponseStream {
    type Item = Result<ModelResponse, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<ModelResponse, ProviderError>>> {
        Poll::Ready(self.increments.pop_front())
    }
}

/// Drains `stream` into a fresh [`StreamAccumulator`].
///
/// Fails on the first `Err` item or the first envelope whose status is not
/// a success; nothing accumulated so far is returned in that case.
pub async fn collect_stream(
    mut stream: BoxedResponseStream<'_>,
) -> Result<StreamSnapshot, ProviderError> {
    let mut accumulator = StreamAccumulator::new();

    while let Some(increment) = stream.next().await {
        let increment = increment?;
        if !increment.is_success() {
            return Err(increment.status_error());
        }

        accumulator.ingest(&increment);
    }

    Ok(accumulator.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProviderErrorKind, ResponseMessage, ToolCallRequest};

    fn boxed(items: Vec<Result<ModelResponse, ProviderError>>) -> BoxedResponseStream<'static> {
        Box::pin(VecResponseStream::new(items))
    }

    #[tokio::test]
    async fn collect_stream_folds_every_increment() {
        let call = ToolCallRequest::new("call_1", "amap_weather", "{}");
        let snapshot = collect_stream(boxed(vec![
            Ok(ModelResponse::from_message(ResponseMessage::text("让我查一下"))),
            Ok(ModelResponse::from_message(ResponseMessage::tool_calls(vec![
                call.clone(),
            ]))),
        ]))
        .await
        .expect("stream should collect");

        assert_eq!(snapshot.text, "让我查一下");
        assert_eq!(snapshot.tool_calls, vec![call]);
    }

    #[tokio::test]
    async fn empty_stream_collects_to_empty_snapshot() {
        let snapshot = collect_stream(boxed(Vec::new()))
            .await
            .expect("empty stream is not an error");
        assert_eq!(snapshot, StreamSnapshot::default());
    }

    #[tokio::test]
    async fn non_success_increment_fails_the_call() {
        let error = collect_stream(boxed(vec![
            Ok(ModelResponse::from_message(ResponseMessage::text("partial"))),
            Ok(ModelResponse::failed(500, Some("InternalError"), None)),
            Ok(ModelResponse::from_message(ResponseMessage::text("never seen"))),
        ]))
        .await
        .expect_err("status 500 should fail");

        assert_eq!(error.kind, ProviderErrorKind::Transport);
        assert_eq!(error.status, Some(500));
    }

    #[tokio::test]
    async fn stream_error_item_is_propagated() {
        let error = collect_stream(boxed(vec![Err(ProviderError::transport("reset"))]))
            .await
            .expect_err("transport error should propagate");
        assert_eq!(error.message, "reset");
    }
}
