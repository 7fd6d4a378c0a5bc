//! Provider trait and identity.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{BoxedResponseStream, ModelRequest, ModelResponse, ProviderError};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    DashScope,
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::DashScope => "dashscope",
        };

        f.write_str(id)
    }
}

/// A chat-completion endpoint that can answer with tool calls.
///
/// `complete` yields the single envelope of a non-streamed call, `stream`
/// yields the increments of a streamed one. Implementations validate the
/// request before any I/O.
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>>;

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedResponseStream<'a>, ProviderError>>;
}
