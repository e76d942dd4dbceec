use reqwest::{Client, Url};
use tokio::sync::RwLock;

use super::refresh;
use super::types::{AccessToken, Credentials};
use crate::error::Result;

/// Token manager
/// Owns the app credentials and the single cached tenant access token.
///
/// The lock only guards reads and writes of the cached value; it is never
/// held across the exchange request. Concurrent calls that all see an
/// expired token may each refresh, and the last write wins. Any token the
/// server issued authenticates any request, so the overlap is harmless.
pub struct TokenManager {
    /// App credentials, fixed for the manager's lifetime
    credentials: Credentials,

    /// Current access token
    token: RwLock<Option<AccessToken>>,

    /// HTTP client for exchange requests
    client: Client,

    /// Tenant access token endpoint
    token_url: Url,
}

impl TokenManager {
    pub fn new(credentials: Credentials, client: Client, token_url: Url) -> Self {
        Self {
            credentials,
            token: RwLock::new(None),
            client,
            token_url,
        }
    }

    /// Get the cached access token, acquiring one if none is cached
    pub async fn access_token(&self, operation: &str) -> Result<String> {
        if let Some(ref token) = *self.token.read().await {
            return Ok(token.value.clone());
        }

        tracing::debug!("No cached access token, acquiring one");
        self.refresh(operation).await
    }

    /// Acquire a fresh access token and replace the cached one
    pub async fn refresh(&self, operation: &str) -> Result<String> {
        let token =
            refresh::exchange_token(&self.client, &self.token_url, &self.credentials, operation)
                .await?;
        let value = token.value.clone();

        *self.token.write().await = Some(token);

        Ok(value)
    }

    /// Snapshot of the cached token, if any
    pub async fn cached_token(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    pub fn app_id(&self) -> &str {
        &self.credentials.app_id
    }
}
