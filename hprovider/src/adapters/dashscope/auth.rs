//! DashScope credential helpers.

use crate::{ProviderError, ProviderId, SecureCredentialManager};

use super::types::DashScopeAuth;

impl SecureCredentialManager {
    /// Stores a DashScope API key. Keys are expected to start with `sk-`.
    pub fn set_dashscope_api_key(&self, api_key: impl Into<String>) -> Result<(), ProviderError> {
        let api_key = api_key.into();
        if !api_key.trim_start().starts_with("sk-") {
            return Err(ProviderError::authentication(
                "DashScope API key must start with 'sk-'",
            ));
        }

        self.set_api_key(ProviderId::DashScope, api_key.trim())
    }
}

pub(crate) fn resolve_dashscope_auth(
    credentials: &SecureCredentialManager,
) -> Result<DashScopeAuth, ProviderError> {
    credentials
        .api_key(ProviderId::DashScope)?
        .map(DashScopeAuth::ApiKey)
        .ok_or_else(|| ProviderError::authentication("no DashScope API key configured"))
}
