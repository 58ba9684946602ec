// src/config.rs
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{NotifyError, NotifyResult};
use crate::services::messaging_service::{EXPO_PUSH_URL, ExpoConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(NotifyError::InvalidConfiguration(format!(
                "STORE_BACKEND must be 'redis' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Expo,
    Log,
}

impl FromStr for GatewayMode {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "expo" => Ok(GatewayMode::Expo),
            "log" => Ok(GatewayMode::Log),
            other => Err(NotifyError::InvalidConfiguration(format!(
                "PUSH_GATEWAY must be 'expo' or 'log', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Server
    pub server_host: String,
    pub server_port: u16,
    pub log_level: String,

    // Stores
    pub store_backend: StoreBackend,
    pub redis_url: String,

    // Push gateway
    pub push_gateway: GatewayMode,
    pub expo_push_url: String,
    pub expo_access_token: Option<String>,
    pub push_timeout_secs: u64,

    // Composer
    pub dispatch_url: Option<String>,

    // Templates
    pub fallback_language: String,
    pub secondary_language: String,
}

impl AppConfig {
    pub fn from_env() -> NotifyResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> NotifyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(AppConfig {
            server_host: var("SERVER_HOST", "0.0.0.0"),
            server_port: parse(&var("SERVER_PORT", "3000"), "SERVER_PORT")?,
            log_level: var("LOG_LEVEL", "info"),

            store_backend: var("STORE_BACKEND", "redis").parse()?,
            redis_url: var("REDIS_URL", "redis://127.0.0.1/"),

            push_gateway: var("PUSH_GATEWAY", "expo").parse()?,
            expo_push_url: var("EXPO_PUSH_URL", EXPO_PUSH_URL),
            expo_access_token: lookup("EXPO_ACCESS_TOKEN").filter(|t| !t.is_empty()),
            push_timeout_secs: parse(&var("PUSH_TIMEOUT_SECS", "10"), "PUSH_TIMEOUT_SECS")?,

            dispatch_url: lookup("DISPATCH_URL").filter(|u| !u.is_empty()),

            fallback_language: var("FALLBACK_LANGUAGE", "he"),
            secondary_language: var("SECONDARY_LANGUAGE", "en"),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(self.push_timeout_secs)
    }

    pub fn expo(&self) -> ExpoConfig {
        ExpoConfig {
            push_url: self.expo_push_url.clone(),
            access_token: self.expo_access_token.clone(),
            timeout: self.push_timeout(),
        }
    }
}

fn parse<T: FromStr>(raw: &str, key: &str) -> NotifyResult<T> {
    raw.parse()
        .map_err(|_| NotifyError::InvalidConfiguration(format!("{} has invalid value '{}'", key, raw)))
}
