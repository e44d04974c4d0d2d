use std::{env, str::FromStr, time::Duration};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_TABLE: &str = "beacon_messages";
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port: u16,
    pub store: StoreConfig,
}

#[derive(Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
    pub timeout: Duration,
}

// The API key never goes to the logs.
impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("table", &self.table)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = required(&lookup, "SUPABASE_URL")?;
        let api_key = required(&lookup, "SUPABASE_KEY")?;
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let table = lookup("SUPABASE_TABLE")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());
        let timeout = parse_or(&lookup, "SUPABASE_TIMEOUT_SECS", DEFAULT_STORE_TIMEOUT.as_secs())?;
        if timeout == 0 {
            return Err(ConfigError::Invalid {
                name: "SUPABASE_TIMEOUT_SECS",
                value: lookup("SUPABASE_TIMEOUT_SECS").unwrap_or_default(),
            });
        }

        Ok(Self {
            port,
            store: StoreConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
                table,
                timeout: Duration::from_secs(timeout),
            },
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
