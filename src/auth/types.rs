// Authentication types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// App credentials exchanged for a tenant access token
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub app_id: String,
    pub app_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

/// Cached bearer token
///
/// Expiry is not tracked for refresh decisions; a stale token is only
/// discovered when the remote service rejects it.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub acquired_at: DateTime<Utc>,
    /// Lifetime in seconds advertised by the server, for diagnostics
    pub expires_in: Option<u64>,
}

/// Tenant access token exchange request
#[derive(Serialize)]
pub struct TenantTokenRequest<'a> {
    pub app_id: &'a str,
    pub app_secret: &'a str,
}

/// Tenant access token exchange response
#[derive(Deserialize)]
pub struct TenantTokenResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub tenant_access_token: Option<String>,
    pub expire: Option<u64>,
}
