//! DashScope transport trait and reqwest-based HTTP implementation.

use std::fmt::Display;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{Client, Response};

use crate::{BoxedResponseStream, ModelResponse, ProviderError, ProviderFuture};

use super::serde_api::{build_api_request, error_from_body, parse_envelope};
use super::sse::{SseDecoder, SseFrame};
use super::types::{DashScopeAuth, DashScopeRequest};

pub const DASHSCOPE_GENERATION_URL: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation";

pub trait DashScopeTransport: Send + Sync + std::fmt::Debug {
    fn complete<'a>(
        &'a self,
        request: DashScopeRequest,
        auth: DashScopeAuth,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>>;

    fn stream<'a>(
        &'a self,
        request: DashScopeRequest,
        auth: DashScopeAuth,
    ) -> ProviderFuture<'a, Result<BoxedResponseStream<'a>, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct DashScopeHttpTransport {
    client: Client,
    endpoint: String,
}

impl DashScopeHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoint: DASHSCOPE_GENERATION_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(
        &self,
        request: DashScopeRequest,
        auth: &DashScopeAuth,
    ) -> Result<Response, ProviderError> {
        let streaming = request.is_streaming();
        let api_request = build_api_request(request);

        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(auth.bearer())
            .json(&api_request);
        if streaming {
            builder = builder
                .header("X-DashScope-SSE", "enable")
                .header("Accept", "text/event-stream");
        }

        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                ProviderError::timeout(err.to_string())
            } else {
                ProviderError::transport(err.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        Ok(response)
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        error_from_body(status, &body)
    }
}

/// Turns one SSE frame into an envelope. Frames without data only matter
/// when they report a failing status.
fn frame_to_response(frame: SseFrame, http_status: u16) -> Option<Result<ModelResponse, ProviderError>> {
    let status = frame.status.unwrap_or(http_status);
    if frame.data.trim().is_empty() {
        if (200..300).contains(&status) {
            return None;
        }
        return Some(Ok(ModelResponse::failed(status, frame.event.as_deref(), None)));
    }

    Some(parse_envelope(status, &frame.data))
}

/// Decodes an SSE byte stream into envelopes. A trailing frame without its
/// closing blank line is still delivered once the bytes run out.
pub(crate) fn decode_sse<'a, S, B, E>(chunks: S, http_status: u16) -> BoxedResponseStream<'a>
where
    S: Stream<Item = Result<B, E>> + Send + 'a,
    B: AsRef<[u8]> + Send + 'a,
    E: Display + Send + 'a,
{
    let stream = try_stream! {
        let mut chunks = Box::pin(chunks);
        let mut decoder = SseDecoder::new();

        while let Some(item) = chunks.next().await {
            let bytes = item.map_err(|err| ProviderError::transport(err.to_string()))?;
            for frame in decoder.push(bytes.as_ref())? {
                if let Some(increment) = frame_to_response(frame, http_status) {
                    yield increment?;
                }
            }
        }

        if let Some(frame) = decoder.finish()? {
            if let Some(increment) = frame_to_response(frame, http_status) {
                yield increment?;
            }
        }
    };

    Box::pin(stream)
}

impl DashScopeTransport for DashScopeHttpTransport {
    fn complete<'a>(
        &'a self,
        mut request: DashScopeRequest,
        auth: DashScopeAuth,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            request.options.stream = false;
            let response = self.send(request, &auth).await?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))?;

            parse_envelope(status, &body)
        })
    }

    fn stream<'a>(
        &'a self,
        mut request: DashScopeRequest,
        auth: DashScopeAuth,
    ) -> ProviderFuture<'a, Result<BoxedResponseStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.options.stream = true;
            let response = self.send(request, &auth).await?;
            let http_status = response.status().as_u16();

            Ok(decode_sse(response.bytes_stream(), http_status))
        })
    }
}
