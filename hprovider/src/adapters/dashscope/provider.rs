//! DashScope provider implementation over a transport.

use std::sync::Arc;

use crate::{
    BoxedResponseStream, ModelProvider, ModelRequest, ModelResponse, ProviderError,
    ProviderFuture, ProviderId, SecureCredentialManager,
};

use super::auth::resolve_dashscope_auth;
use super::transport::DashScopeTransport;
use super::types::DashScopeRequest;

#[derive(Clone)]
pub struct DashScopeProvider {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn DashScopeTransport>,
    fallback_model: String,
}

impl std::fmt::Debug for DashScopeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashScopeProvider")
            .field("transport", &self.transport)
            .field("fallback_model", &self.fallback_model)
            .finish_non_exhaustive()
    }
}

impl DashScopeProvider {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn DashScopeTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
            fallback_model: "qwen-max".to_string(),
        }
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    pub(crate) fn build_dashscope_request(
        &self,
        request: ModelRequest,
        stream: bool,
    ) -> DashScopeRequest {
        let model = if request.model.trim().is_empty() {
            self.fallback_model.clone()
        } else {
            request.model
        };

        let mut options = request.options;
        options.stream = stream;

        DashScopeRequest {
            model,
            messages: request.messages,
            tools: request.tools,
            options,
        }
    }

    fn prepare(&self, mut request: ModelRequest) -> Result<ModelRequest, ProviderError> {
        if request.model.trim().is_empty() {
            request.model.clone_from(&self.fallback_model);
        }

        request.validate()?;
        Ok(request)
    }
}

impl ModelProvider for DashScopeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::DashScope
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let request = self.prepare(request)?;
            let auth = resolve_dashscope_auth(&self.credentials)?;
            let request = self.build_dashscope_request(request, false);
            self.transport.complete(request, auth).await
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedResponseStream<'a>, ProviderError>> {
        Box::pin(async move {
            let request = self.prepare(request)?;
            let auth = resolve_dashscope_auth(&self.credentials)?;
            let request = self.build_dashscope_request(request, true);
            self.transport.stream(request, auth).await
        })
    }
}
