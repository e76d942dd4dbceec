// Feishu Sheets - library root

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;

pub use client::{ConnectionReport, SheetsClient};
pub use error::SheetsError;
