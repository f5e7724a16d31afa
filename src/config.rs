//! Token and client configuration
//!
//! Built once at startup and passed by reference into the HTTP-calling
//! components; nothing here is process-global.

use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::time::Duration;

/// Per-request ceiling on the blocking client. Generous: probe misses are
/// treated as absence of evidence, not worth waiting minutes for.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub debug: bool,
}

impl Config {
    /// Load configuration with a required API token.
    pub fn load(debug: bool) -> Result<Self> {
        let token = Self::github_token().context(
            "No GitHub token found. Set GITHUB_TOKEN or store one in ~/.github/token",
        )?;
        Ok(Self { token, debug })
    }

    /// Get GitHub token from environment or the ~/.github/token file
    pub fn github_token() -> Option<String> {
        // First try environment variables
        for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
            if let Ok(token) = std::env::var(var) {
                if !token.is_empty() {
                    return Some(token);
                }
            }
        }

        // Fall back to the token file
        let home = UserDirs::new()?;
        let path = home.home_dir().join(".github").join("token");
        let token = fs::read_to_string(path).ok()?.trim().to_string();
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }

    /// Build the blocking HTTP client shared by all components.
    pub fn http_client() -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .user_agent(concat!("litscan/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")
    }
}
