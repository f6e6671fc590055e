use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8000";
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Origin used for absolute links (pagination, media, short links).
    /// Never ends with a slash.
    pub public_url: String,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = with_default(&lookup, "FOODGRAM_BIND_ADDR", DEFAULT_BIND_ADDR)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(&lookup, "FOODGRAM_BIND_ADDR", e.to_string()))?;

        let public_url = with_default(&lookup, "FOODGRAM_PUBLIC_URL", DEFAULT_PUBLIC_URL);
        let parsed = url::Url::parse(&public_url)
            .map_err(|e| invalid(&lookup, "FOODGRAM_PUBLIC_URL", e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(
                &lookup,
                "FOODGRAM_PUBLIC_URL",
                "scheme must be http or https".to_string(),
            ));
        }
        let public_url = public_url.trim_end_matches('/').to_string();

        let max_body_bytes = match lookup("FOODGRAM_MAX_BODY_BYTES") {
            None => {
                tracing::info!(
                    "FOODGRAM_MAX_BODY_BYTES not set, using {}",
                    DEFAULT_MAX_BODY_BYTES
                );
                DEFAULT_MAX_BODY_BYTES
            }
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| invalid(&lookup, "FOODGRAM_MAX_BODY_BYTES", e.to_string()))?,
        };

        Ok(Self {
            database_url,
            bind_addr,
            public_url,
            max_body_bytes,
        })
    }
}

fn with_default<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value.trim().to_string(),
        None => {
            tracing::info!("{} not set, using {}", name, default);
            default.to_string()
        }
    }
}

fn invalid<F>(lookup: &F, name: &'static str, reason: String) -> ConfigError
where
    F: Fn(&str) -> Option<String>,
{
    ConfigError::Invalid {
        name,
        value: lookup(name).unwrap_or_default(),
        reason,
    }
}
