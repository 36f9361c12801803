use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::env;
use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub gateway_url: String,
    pub model: String,
    /// `None` when `COMPLETION_TIMEOUT_SECS=0`.
    pub completion_timeout: Option<Duration>,
    pub database_url: Option<String>,
    pub timezone: Tz,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = match var("COMPLETION_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("COMPLETION_TIMEOUT_SECS is not a number: {}", raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let port = match var("APP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a valid port: {}", raw))?,
            None => 8080,
        };

        let timezone = match var("APP_TIMEZONE") {
            Some(raw) => raw
                .trim()
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("APP_TIMEZONE is not a known zone: {}", e))?,
            None => chrono_tz::Asia::Kolkata,
        };

        Ok(Self {
            api_key: var("AI_GATEWAY_API_KEY"),
            gateway_url: var("AI_GATEWAY_URL").unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
            model: var("AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            completion_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            database_url: var("DATABASE_URL"),
            timezone,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
