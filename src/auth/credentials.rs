// Credential loading from the process environment

use super::types::Credentials;
use crate::config::resolve_env_var;
use crate::error::{Result, SheetsError};

const OPERATION: &str = "load credentials";

impl Credentials {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    /// Load credentials through an arbitrary variable lookup
    ///
    /// `FEISHU_APP_SECRET` takes precedence over `FEISHU_APP_SECRET_PATH`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |name: &str| {
            resolve_env_var(name, &lookup)
                .map_err(|e| SheetsError::local(OPERATION, format!("{:#}", e)))
        };

        let app_id = resolve("FEISHU_APP_ID")?;
        let app_secret = match resolve("FEISHU_APP_SECRET")? {
            Some(secret) => Some(secret),
            None => resolve("FEISHU_APP_SECRET_PATH")?,
        };

        match (app_id, app_secret) {
            (Some(app_id), Some(app_secret)) => Ok(Self::new(app_id, app_secret)),
            _ => Err(SheetsError::local(
                OPERATION,
                "FEISHU_APP_ID and FEISHU_APP_SECRET (or FEISHU_APP_SECRET_PATH) must be set",
            )),
        }
    }

    /// Load credentials from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_load_from_plain_variables() {
        let creds = Credentials::from_lookup(lookup(&[
            ("FEISHU_APP_ID", "cli_a1"),
            ("FEISHU_APP_SECRET", "s3cr3t"),
        ]))
        .unwrap();
        assert_eq!(creds, Credentials::new("cli_a1", "s3cr3t"));
    }

    #[test]
    fn test_secret_path_is_dereferenced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "secret\n").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let creds = Credentials::from_lookup(lookup(&[
            ("FEISHU_APP_ID", "cli_a1"),
            ("FEISHU_APP_SECRET_PATH", path.as_str()),
        ]))
        .unwrap();
        assert_eq!(creds.app_secret, "secret");
    }

    #[test]
    fn test_inline_secret_wins_over_path() {
        let creds = Credentials::from_lookup(lookup(&[
            ("FEISHU_APP_ID", "cli_a1"),
            ("FEISHU_APP_SECRET", "inline"),
            ("FEISHU_APP_SECRET_PATH", "/nonexistent/secret"),
        ]))
        .unwrap();
        assert_eq!(creds.app_secret, "inline");
    }

    #[test]
    fn test_missing_credentials() {
        let err = Credentials::from_lookup(lookup(&[("FEISHU_APP_ID", "cli_a1")])).unwrap_err();
        assert!(matches!(err, SheetsError::Local { .. }));
        assert!(err.to_string().contains("FEISHU_APP_SECRET"));
    }

    #[test]
    fn test_unreadable_secret_path_fails_fast() {
        let err = Credentials::from_lookup(lookup(&[
            ("FEISHU_APP_ID", "cli_a1"),
            ("FEISHU_APP_SECRET_PATH", "/nonexistent/secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SheetsError::Local { .. }));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("cli_a1", "s3cr3t");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("cli_a1"));
        assert!(!debug.contains("s3cr3t"));
    }
}
