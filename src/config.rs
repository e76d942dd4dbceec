use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use crate::auth::Credentials;
use crate::error::SheetsError;

/// Default Feishu Open API root
pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn/open-apis";

/// Feishu spreadsheet command-line tool
#[derive(Parser, Debug)]
#[command(name = "feishu-sheets", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Feishu app ID (falls back to FEISHU_APP_ID)
    #[arg(long, global = true)]
    pub app_id: Option<String>,

    /// Feishu Open API base URL
    #[arg(long, global = true, env = "FEISHU_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, env = "FEISHU_HTTP_TIMEOUT", default_value = "30")]
    pub timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Test the Feishu connection by requesting an access token
    Test,

    /// Create a spreadsheet
    CreateSpreadsheet {
        /// Spreadsheet title
        #[arg(long)]
        title: Option<String>,
        /// Target folder token
        #[arg(long)]
        folder_token: Option<String>,
    },

    /// Show spreadsheet metadata
    GetSpreadsheet {
        #[arg(long)]
        spreadsheet_token: String,
    },

    /// List all sheets in a spreadsheet
    ListSheets {
        #[arg(long)]
        spreadsheet_token: String,
    },

    /// Show a single sheet
    GetSheet {
        #[arg(long)]
        spreadsheet_token: String,
        #[arg(long)]
        sheet_id: String,
    },

    /// Add a sheet
    AddSheet {
        #[arg(long)]
        spreadsheet_token: String,
        /// Sheet title
        #[arg(long)]
        title: String,
        /// Insert position
        #[arg(long)]
        index: Option<u32>,
    },

    /// Delete a sheet
    DeleteSheet {
        #[arg(long)]
        spreadsheet_token: String,
        #[arg(long)]
        sheet_id: String,
    },

    /// Read cell values
    Read {
        #[arg(long)]
        spreadsheet_token: String,
        /// Range, e.g. sheetId!A1:C5
        #[arg(long)]
        range: String,
        /// ToString, FormattedValue, UnformattedValue or Formula
        #[arg(long)]
        value_render: Option<String>,
        /// Date/time rendering, e.g. FormattedString
        #[arg(long)]
        date_time_render: Option<String>,
    },

    /// Write cell values
    Write {
        #[arg(long)]
        spreadsheet_token: String,
        #[arg(long)]
        range: String,
        /// Two-dimensional JSON array, or @path to a JSON file
        #[arg(long)]
        values: String,
    },

    /// Append rows after the data in a range
    Append {
        #[arg(long)]
        spreadsheet_token: String,
        #[arg(long)]
        range: String,
        /// Two-dimensional JSON array, or @path to a JSON file
        #[arg(long)]
        values: String,
    },

    /// Insert rows before the start of a range
    Prepend {
        #[arg(long)]
        spreadsheet_token: String,
        #[arg(long)]
        range: String,
        /// Two-dimensional JSON array, or @path to a JSON file
        #[arg(long)]
        values: String,
    },

    /// Read several ranges at once
    BatchRead {
        #[arg(long)]
        spreadsheet_token: String,
        /// Comma separated ranges: sheetId!A1:C5,sheetId!D1:F5
        #[arg(long)]
        ranges: String,
        #[arg(long)]
        value_render: Option<String>,
        #[arg(long)]
        date_time_render: Option<String>,
    },

    /// Write several ranges at once
    BatchWrite {
        #[arg(long)]
        spreadsheet_token: String,
        /// JSON array of {range, values}, or @path to a JSON file
        #[arg(long)]
        data: String,
    },
}

impl CliArgs {
    /// Parse arguments after loading `.env` so env fallbacks see its values
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        CliArgs::parse()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,
    pub base_url: String,
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,
    pub log_level: String,
}

impl Config {
    /// Build the runtime configuration: CLI > ENV > defaults
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        Self::from_args_with(args, |name| std::env::var(name).ok())
    }

    /// Build the runtime configuration, reading variables through `lookup`
    pub fn from_args_with<F>(args: &CliArgs, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials::from_lookup(|name| {
            if name == "FEISHU_APP_ID" {
                if let Some(ref app_id) = args.app_id {
                    return Some(app_id.clone());
                }
            }
            lookup(name)
        })?;

        let config = Config {
            credentials,
            base_url: args.base_url.clone(),
            http_connect_timeout: lookup("FEISHU_HTTP_CONNECT_TIMEOUT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(10),
            http_request_timeout: args.timeout,
            log_level: args.log_level.to_lowercase(),
        };

        Ok(config)
    }
}

/// Read a configuration variable through `lookup`
///
/// Variables whose name ends in `_PATH` hold a file path; the file is read
/// and its trimmed contents become the value. Empty values count as unset.
pub fn resolve_env_var<F>(name: &str, lookup: F) -> Result<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match lookup(name) {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(None),
    };

    if !name.ends_with("_PATH") {
        return Ok(Some(value));
    }

    let path = expand_tilde(value.trim());
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {} file: {}", name, path.display()))?;

    let contents = contents.trim();
    if contents.is_empty() {
        return Ok(None);
    }
    Ok(Some(contents.to_string()))
}

/// Expand tilde (~) in file paths to user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            let rest = rest.trim_start_matches('/');
            if rest.is_empty() {
                return home;
            }
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse a JSON command-line value: inline JSON, or `@path` to a JSON file
pub fn parse_json_input(input: &str) -> crate::error::Result<Value> {
    const OPERATION: &str = "parse JSON input";

    if let Some(file) = input.strip_prefix('@') {
        let path = expand_tilde(file);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            SheetsError::local(
                OPERATION,
                format!("unable to read {}: {}", path.display(), e),
            )
        })?;
        return serde_json::from_str(&content).map_err(|e| {
            SheetsError::local(
                OPERATION,
                format!("unable to parse {}: {}", path.display(), e),
            )
        });
    }

    serde_json::from_str(input)
        .map_err(|e| SheetsError::local(OPERATION, format!("invalid JSON: {}", e)))
}
