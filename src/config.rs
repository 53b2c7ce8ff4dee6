use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub upstream: Option<UpstreamConfig>,
    pub fixture_path: Option<PathBuf>,
    pub public_api_base: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl UpstreamConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            max_attempts: 2,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let listen_addr: SocketAddr = env::var("LEADBOARD_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5000".to_string())
            .parse()
            .context("invalid LEADBOARD_ADDR")?;

        let upstream = match env::var("LEADBOARD_UPSTREAM_URL") {
            Ok(url) if !url.trim().is_empty() => {
                let max_attempts = attempts_from(parse_number("LEADBOARD_UPSTREAM_ATTEMPTS", 2)?)?;

                Some(UpstreamConfig {
                    base_url: url.trim().to_string(),
                    timeout: Duration::from_secs(parse_number("LEADBOARD_UPSTREAM_TIMEOUT_SECS", 10)?),
                    max_attempts,
                    retry_backoff: Duration::from_millis(parse_number("LEADBOARD_UPSTREAM_BACKOFF_MS", 250)?),
                })
            }
            _ => None,
        };

        let fixture_path = env::var("LEADBOARD_FIXTURE_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let public_api_base =
            env::var("LEADBOARD_PUBLIC_API_BASE").unwrap_or_else(|_| "/api".to_string());

        let log_format = match env::var("LEADBOARD_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("plain") | Err(_) => LogFormat::Plain,
            Ok(other) => bail!("LEADBOARD_LOG_FORMAT must be `plain` or `json`, got `{other}`"),
        };

        Ok(Self {
            listen_addr,
            upstream,
            fixture_path,
            public_api_base,
            log_format,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }
}

fn parse_number(env_key: &str, default: u64) -> Result<u64> {
    let raw = env::var(env_key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .with_context(|| format!("{env_key} must be a non-negative integer"))
}

fn attempts_from(raw: u64) -> Result<u32> {
    let attempts = u32::try_from(raw).context("LEADBOARD_UPSTREAM_ATTEMPTS is out of range")?;
    if attempts == 0 {
        bail!("LEADBOARD_UPSTREAM_ATTEMPTS must be at least 1");
    }
    Ok(attempts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempts_bounds() {
        assert_eq!(attempts_from(3).unwrap(), 3);
        assert!(attempts_from(0).is_err());

        let err = attempts_from(u64::from(u32::MAX) + 1).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
