use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use recipes_client::ClientConfig;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub api_key: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub session_file: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = get_required(&lookup, "RECIPES_API_URL")?;
        let api_key = get_required(&lookup, "RECIPES_API_KEY")?;
        let connect_timeout_secs = parse_u64(&lookup, "RECIPES_CONNECT_TIMEOUT_SECS", 5)?;
        let request_timeout_secs = parse_u64(&lookup, "RECIPES_REQUEST_TIMEOUT_SECS", 15)?;
        let log_level = lookup("LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| "warn".to_string());
        let session_file = lookup("RECIPES_SESSION_FILE")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| ".recipes_session".to_string());

        Ok(Self {
            api_url,
            api_key,
            connect_timeout_secs,
            request_timeout_secs,
            log_level,
            session_file,
        })
    }

    /// Параметры клиента; `api_url` из командной строки важнее окружения.
    pub fn client_config(&self, api_url: Option<String>) -> ClientConfig {
        let base_url = api_url.unwrap_or_else(|| self.api_url.clone());
        ClientConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..ClientConfig::new(normalize_url(base_url), self.api_key.clone())
        }
    }
}

fn get_required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    let value = lookup(key).with_context(|| format!("{key} is required"))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    let value = lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

fn normalize_url(url: String) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url;
    }

    format!("https://{url}")
}
