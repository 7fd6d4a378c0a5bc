//! In-memory API key storage with redacted formatting.
//!
//! ```rust
//! use hprovider::{ProviderId, SecureCredentialManager};
//!
//! let credentials = SecureCredentialManager::new();
//! credentials
//!     .set_api_key(ProviderId::DashScope, "sk-example")
//!     .expect("key should store");
//!
//! let key = credentials
//!     .api_key(ProviderId::DashScope)
//!     .expect("lock should not be poisoned")
//!     .expect("key should be present");
//! assert_eq!(key.expose(), "sk-example");
//! assert_eq!(format!("{key:?}"), "[REDACTED]");
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::{ProviderError, ProviderId};

/// A string whose `Debug`/`Display` never reveal the value. The buffer is
/// zeroed when the value is dropped.
#[derive(PartialEq, Eq, Default)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.value).into_bytes();
        bytes.fill(0);
    }
}

#[derive(Default)]
pub struct SecureCredentialManager {
    api_keys: Mutex<HashMap<ProviderId, SecretString>>,
}

impl std::fmt::Debug for SecureCredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers = self
            .api_keys
            .lock()
            .map(|keys| keys.keys().copied().collect::<Vec<_>>())
            .unwrap_or_default();

        f.debug_struct("SecureCredentialManager")
            .field("providers", &providers)
            .finish()
    }
}

impl SecureCredentialManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_api_key(
        &self,
        provider: ProviderId,
        api_key: impl Into<String>,
    ) -> Result<(), ProviderError> {
        let api_key = SecretString::new(api_key);
        if api_key.is_empty() {
            return Err(ProviderError::authentication("api key must not be empty"));
        }

        self.api_keys()?.insert(provider, api_key);
        Ok(())
    }

    pub fn has_credentials(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        Ok(self.api_keys()?.contains_key(&provider))
    }

    pub fn api_key(&self, provider: ProviderId) -> Result<Option<SecretString>, ProviderError> {
        Ok(self.api_keys()?.get(&provider).cloned())
    }

    pub fn clear(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        Ok(self.api_keys()?.remove(&provider).is_some())
    }

    fn api_keys(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<ProviderId, SecretString>>, ProviderError> {
        self.api_keys
            .lock()
            .map_err(|_| ProviderError::other("credential manager lock poisoned"))
    }
}
