use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::journal::analysis::RetryPolicy;
use crate::llm_client::{LlmSettings, DEFAULT_API_URL, DEFAULT_MODEL};
use crate::mood::expression::{HumeSettings, DEFAULT_HUME_API_URL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerBackend {
    Llm,
    Mock,
}

impl FromStr for AnalyzerBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "llm" => Ok(AnalyzerBackend::Llm),
            "mock" => Ok(AnalyzerBackend::Mock),
            other => bail!("MOOD_ANALYZER must be 'llm' or 'mock', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// Credentials are optional so the API can start without them; analysis then
/// fails per entry with a non-retryable configuration error.
#[derive(Debug, Clone)]
pub struct Config {
    /// No database URL means entries live in memory.
    pub database_url: Option<String>,
    pub analyzer: AnalyzerBackend,
    pub llm: LlmSettings,
    pub hume: HumeSettings,
    pub retry: RetryPolicy,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            analyzer: parse_env("MOOD_ANALYZER", AnalyzerBackend::Llm)?,
            llm: LlmSettings {
                api_key: optional_env("ANTHROPIC_API_KEY"),
                api_url: optional_env("ANTHROPIC_API_URL")
                    .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                model: optional_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 30)?),
            },
            hume: HumeSettings {
                api_key: optional_env("HUME_API_KEY"),
                base_url: optional_env("HUME_API_URL")
                    .unwrap_or_else(|| DEFAULT_HUME_API_URL.to_string()),
                poll_interval: Duration::from_millis(parse_env("HUME_POLL_INTERVAL_MS", 2000)?),
                max_polls: parse_env("HUME_MAX_POLLS", 60)?,
                timeout: Duration::from_secs(parse_env("HUME_TIMEOUT_SECS", 30)?),
            },
            retry: RetryPolicy {
                max_attempts: parse_env("ANALYSIS_MAX_ATTEMPTS", 3)?,
                base_delay: Duration::from_millis(parse_env("ANALYSIS_RETRY_BASE_MS", 1000)?),
            },
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Whether video entries can be measured; without a key they fail analysis.
    pub fn has_expression_service(&self) -> bool {
        self.hume.api_key.is_some()
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
    }
}
