use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_STORAGE_DIR: &str = ".resume-client";
const DEFAULT_TIMEOUT_SECS: &str = "120";

/// Client configuration loaded from environment variables.
/// Every value has a default; only malformed values are rejected.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub storage_dir: PathBuf,
    pub export_dir: PathBuf,
    pub request_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let timeout_secs = env_or("RESUME_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .context("RESUME_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Config {
            api_url: env_or("RESUME_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            storage_dir: PathBuf::from(env_or("RESUME_STORAGE_DIR", DEFAULT_STORAGE_DIR)),
            export_dir: PathBuf::from(env_or("RESUME_EXPORT_DIR", ".")),
            request_timeout: Duration::from_secs(timeout_secs),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Replaces the backend URL, e.g. from a command-line flag.
    pub fn with_api_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.api_url = url.trim_end_matches('/').to_string();
        }
        self
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
