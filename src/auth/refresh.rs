// Tenant access token exchange

use chrono::Utc;
use reqwest::{header, Client, Url};
use serde_json::Value;

use super::types::{AccessToken, Credentials, TenantTokenRequest, TenantTokenResponse};
use crate::error::{Result, SheetsError};

/// Exchange app credentials for a tenant access token
///
/// `operation` names the logical call that needed the token, so a failed
/// exchange is reported against it.
pub async fn exchange_token(
    client: &Client,
    token_url: &Url,
    creds: &Credentials,
    operation: &str,
) -> Result<AccessToken> {
    tracing::debug!(app_id = %creds.app_id, "Requesting tenant access token");

    let request = TenantTokenRequest {
        app_id: &creds.app_id,
        app_secret: &creds.app_secret,
    };
    let body = serde_json::to_vec(&request)
        .map_err(|e| SheetsError::local(operation, format!("unable to encode token request: {}", e)))?;

    let response = client
        .post(token_url.clone())
        .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
        .body(body)
        .send()
        .await
        .map_err(|e| {
            SheetsError::network(operation, format!("access token request failed: {}", e))
        })?;

    let status = response.status();
    let text = response.text().await.map_err(|e| {
        SheetsError::network(operation, format!("access token response unreadable: {}", e))
    })?;

    let raw: Value = serde_json::from_str(&text).unwrap_or(Value::String(text.clone()));
    let remote = |code: Option<i64>, message: String| SheetsError::Remote {
        operation: operation.to_string(),
        status: status.as_u16(),
        code,
        message,
        raw: raw.clone(),
    };

    let data: TenantTokenResponse = serde_json::from_value(raw.clone()).map_err(|_| {
        remote(
            None,
            format!(
                "unexpected access token response: {}",
                status.canonical_reason().unwrap_or("unknown status")
            ),
        )
    })?;

    if !status.is_success() || data.code != 0 {
        tracing::error!(
            status = status.as_u16(),
            code = data.code,
            msg = %data.msg,
            "Tenant access token request rejected"
        );
        return Err(remote(
            Some(data.code),
            format!("unable to obtain access token: {}", data.msg),
        ));
    }

    let value = match data.tenant_access_token {
        Some(token) if !token.is_empty() => token,
        _ => {
            return Err(remote(
                Some(data.code),
                "access token response does not contain tenant_access_token".to_string(),
            ))
        }
    };

    tracing::info!(expire = ?data.expire, "Tenant access token acquired");

    Ok(AccessToken {
        value,
        acquired_at: Utc::now(),
        expires_in: data.expire,
    })
}
