use reqwest::{header, Client, Method, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{Credentials, TokenManager};
use crate::error::{Result, SheetsError};

/// The two API surfaces; both share one token and one refresh policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiSurface {
    /// Spreadsheet metadata and sheet queries (`/sheets/v3`)
    Meta,
    /// Cell data and sheet mutations (`/sheets/v2`)
    Data,
}

impl ApiSurface {
    fn prefix(&self) -> &'static [&'static str] {
        match self {
            ApiSurface::Meta => &["sheets", "v3"],
            ApiSurface::Data => &["sheets", "v2"],
        }
    }
}

/// Replayable description of one API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub surface: ApiSurface,
    pub method: Method,
    /// Path segments below the surface prefix, percent-encoded on assembly
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new<I, S>(surface: ApiSurface, method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            surface,
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP client for the Feishu spreadsheet API
/// Attaches the bearer token to every call and re-authenticates once on
/// token expiry.
pub struct SheetsHttpClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Token manager shared by both API surfaces
    auth: Arc<TokenManager>,

    /// Open API root, e.g. https://open.feishu.cn/open-apis
    base_url: Url,
}

impl SheetsHttpClient {
    /// Create a new HTTP client
    pub fn new(
        credentials: Credentials,
        base_url: &str,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> Result<Self> {
        const OPERATION: &str = "create client";

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .map_err(|e| {
                SheetsError::local(OPERATION, format!("failed to create HTTP client: {}", e))
            })?;

        let base_url = Url::parse(base_url).map_err(|e| {
            SheetsError::local(OPERATION, format!("invalid base URL '{}': {}", base_url, e))
        })?;

        let token_url = join_segments(
            &base_url,
            ["auth", "v3", "tenant_access_token", "internal", ""],
            OPERATION,
        )?;
        let auth = Arc::new(TokenManager::new(credentials, client.clone(), token_url));

        Ok(Self {
            client,
            auth,
            base_url,
        })
    }

    /// Get the token manager
    pub fn auth(&self) -> &TokenManager {
        &self.auth
    }

    /// Dispatch a request with the cached bearer token
    ///
    /// When the service reports the token as expired the token is
    /// re-acquired and the identical request is replayed exactly once.
    /// Every other outcome, including a second expiry, is returned as is.
    pub async fn dispatch_with_auth(&self, operation: &str, request: &ApiRequest) -> Result<Value> {
        let url = self.build_url(operation, request)?;

        let token = self.auth.access_token(operation).await?;
        match self.dispatch(operation, &url, request, &token).await {
            Err(e) if e.is_token_expired() => {
                tracing::warn!(
                    operation = operation,
                    "Access token rejected as expired, refreshing and retrying once"
                );
                let token = self.auth.refresh(operation).await?;
                self.dispatch(operation, &url, request, &token).await
            }
            result => result,
        }
    }

    fn build_url(&self, operation: &str, request: &ApiRequest) -> Result<Url> {
        let mut segments: Vec<&str> = request.surface.prefix().to_vec();
        segments.extend(request.segments.iter().map(String::as_str));
        join_segments(&self.base_url, segments, operation)
    }

    /// Send one attempt and classify the outcome
    async fn dispatch(
        &self,
        operation: &str,
        url: &Url,
        request: &ApiRequest,
        token: &str,
    ) -> Result<Value> {
        tracing::debug!(
            method = %request.method,
            url = %url,
            operation = operation,
            "Sending HTTP request"
        );

        let mut builder = self
            .client
            .request(request.method.clone(), url.clone())
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/json; charset=utf-8");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            let bytes = serde_json::to_vec(body).map_err(|e| {
                SheetsError::local(operation, format!("unable to encode request body: {}", e))
            })?;
            builder = builder.body(bytes);
        }

        let response = builder.send().await.map_err(|e| {
            let error_kind = if e.is_timeout() {
                "timeout"
            } else if e.is_connect() {
                "connection_failed"
            } else if e.is_request() {
                "request_error"
            } else {
                "unknown"
            };
            tracing::warn!(
                error_kind = error_kind,
                error = %e,
                url = %url,
                "HTTP request error"
            );
            SheetsError::network(operation, format!("{} ({})", e, error_kind))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            SheetsError::network(operation, format!("failed to read response body: {}", e))
        })?;

        tracing::debug!(status = %status, "Received HTTP response");

        let json: Option<Value> = serde_json::from_str(&text).ok();
        let code = json
            .as_ref()
            .and_then(|v| v.get("code"))
            .and_then(Value::as_i64);

        if status.is_success() && json.is_some() && code.unwrap_or(0) == 0 {
            return Ok(json.unwrap_or(Value::Null));
        }

        let message = json
            .as_ref()
            .and_then(|v| v.get("msg").or_else(|| v.get("message")))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                if status.is_success() {
                    "response is not valid JSON".to_string()
                } else {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string()
                }
            });

        tracing::error!(
            status = status.as_u16(),
            code = ?code,
            url = %url,
            message = %message,
            "HTTP request failed with error response"
        );

        Err(SheetsError::Remote {
            operation: operation.to_string(),
            status: status.as_u16(),
            code,
            message,
            raw: json.unwrap_or(Value::String(text)),
        })
    }
}

/// Append path segments to `base`, percent-encoding each one
fn join_segments<'a, I>(base: &Url, segments: I, operation: &str) -> Result<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SheetsError::local(operation, format!("base URL cannot carry a path: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
