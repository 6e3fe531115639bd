//! Proxy configuration.

use std::path::PathBuf;

use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

/// Configuration for the proxy.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// Shared supporter access key. Empty disables supporter access.
    pub access_key: String,
    /// Workflow endpoint submissions are forwarded to. Empty disables
    /// forwarding.
    pub flow_url: String,
    /// HS256 secret for signed QR links.
    pub signing_secret: String,
    /// Survey page that one-time links and QR redirects point at.
    pub page_url: Option<String>,
    /// Externally reachable base URL of this proxy, used in signed QR links.
    pub public_base_url: String,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable              | Default                                  |
    /// |-----------------------|------------------------------------------|
    /// | `BIND_ADDR`           | `127.0.0.1:3100`                         |
    /// | `ACCESS_KEY`          | empty (supporter access disabled)        |
    /// | `FLOW_URL`            | empty (forwarding disabled)              |
    /// | `LINK_SIGNING_SECRET` | generated & persisted to file            |
    /// | `SURVEY_PAGE_URL`     | unset (links carry only the token)       |
    /// | `PUBLIC_BASE_URL`     | `http://<BIND_ADDR>`                     |
    pub fn from_env() -> Self {
        let bind_addr = env_or("BIND_ADDR", "127.0.0.1:3100");
        Self {
            access_key: env_or("ACCESS_KEY", ""),
            flow_url: env_or("FLOW_URL", ""),
            signing_secret: resolve_signing_secret(),
            page_url: std::env::var("SURVEY_PAGE_URL").ok().filter(|v| !v.is_empty()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| format!("http://{bind_addr}")),
            bind_addr,
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

/// Resolve the QR signing secret: env var `LINK_SIGNING_SECRET` → persisted
/// file → newly generated (and persisted).
pub fn resolve_signing_secret() -> String {
    if let Ok(secret) = std::env::var("LINK_SIGNING_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    let path = signing_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&path, &secret);
    info!(path = %path.display(), "generated new link signing secret");
    secret
}

fn signing_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("survey-kiosk")
        .join("link-signing-secret")
}
