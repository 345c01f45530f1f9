use serde::Deserialize;
use thiserror::Error;

use crate::i18n::Locale;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub locale: Locale,
    pub email_dns_check: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 10,
            host: "0.0.0.0".into(),
            port: 8000,
            locale: Locale::En,
            email_dns_check: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_url = get("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let max_connections = parse_or(&get, "DB_MAX_CONNECTIONS", defaults.max_connections)?;
        let host = get("APP_HOST").unwrap_or(defaults.host);
        let port = parse_or(&get, "APP_PORT", defaults.port)?;
        let locale = match get("APP_LOCALE") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                var: "APP_LOCALE",
                value: v,
            })?,
            None => defaults.locale,
        };
        let email_dns_check = match get("EMAIL_DNS_CHECK") {
            Some(v) => parse_flag(&v).ok_or(ConfigError::Invalid {
                var: "EMAIL_DNS_CHECK",
                value: v,
            })?,
            None => defaults.email_dns_check,
        };

        Ok(Self {
            database_url,
            max_connections,
            host,
            port,
            locale,
            email_dns_check,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(var) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid { var, value: v }),
        None => Ok(default),
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
