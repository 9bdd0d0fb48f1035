use std::env;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not defined")]
    Missing(&'static str),
    #[error("Invalid {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub text_api_key: String,
    pub text_model: String,
    pub room_ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
    pub connection_timeout_seconds: u64,
}

impl Config {
    /// Read configuration from the process environment. Both secrets are
    /// required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            database_url: required("DATABASE_URL")?,
            text_api_key: required("TEXT_API_KEY")?,
            text_model: lookup("TEXT_MODEL").unwrap_or_else(|| "gemini-pro".to_string()),
            room_ttl_seconds: parse_or(&lookup, "ROOM_TTL_SECONDS", 3600)?,
            cleanup_interval_seconds: parse_or(&lookup, "CLEANUP_INTERVAL_SECONDS", 30)?,
            connection_timeout_seconds: parse_or(&lookup, "CONNECTION_TIMEOUT_SECONDS", 300)?,
        })
    }

    pub fn room_ttl(&self) -> Duration {
        Duration::from_secs(self.room_ttl_seconds)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds.max(1))
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
