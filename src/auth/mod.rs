// Authentication module
// Loads app credentials and manages the tenant access token

mod credentials;
mod manager;
mod refresh;
mod types;

pub use manager::TokenManager;
pub use types::{AccessToken, Credentials};
