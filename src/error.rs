// Error handling module
// Defines the error taxonomy surfaced by every client operation

use serde_json::Value;
use thiserror::Error;

/// Application code Feishu returns when a tenant access token is invalid or expired
pub const TOKEN_EXPIRED_CODE: i64 = 99991663;

/// Errors that can occur while talking to the spreadsheet API
///
/// Every variant carries the name of the operation that failed so callers
/// can report a single message without extra context.
#[derive(Error, Debug)]
pub enum SheetsError {
    /// The remote service answered with a non-success status or envelope code
    #[error("{operation} failed: {message} (status: {status})")]
    Remote {
        operation: String,
        status: u16,
        code: Option<i64>,
        message: String,
        raw: Value,
    },

    /// No response was received
    #[error("{operation} failed: network error, unable to reach Feishu: {message}")]
    Network { operation: String, message: String },

    /// The request could not be assembled locally
    #[error("{operation} failed: {message}")]
    Local { operation: String, message: String },
}

impl SheetsError {
    pub fn local(operation: &str, message: impl Into<String>) -> Self {
        SheetsError::Local {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn network(operation: &str, message: impl Into<String>) -> Self {
        SheetsError::Network {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Name of the operation that produced this error
    pub fn operation(&self) -> &str {
        match self {
            SheetsError::Remote { operation, .. }
            | SheetsError::Network { operation, .. }
            | SheetsError::Local { operation, .. } => operation,
        }
    }

    /// Whether the remote service rejected the bearer token as expired
    pub fn is_token_expired(&self) -> bool {
        matches!(
            self,
            SheetsError::Remote {
                code: Some(TOKEN_EXPIRED_CODE),
                ..
            }
        )
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, SheetsError>;
