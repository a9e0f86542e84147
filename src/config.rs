use std::str::FromStr;

use thiserror::Error;

use crate::api::yahoo::YahooClient;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env` if present)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_address: String,
    pub yahoo_base_url: String,
    pub yahoo_cookie_url: String,
    pub user_agent: String,
    pub chart_width: u32,
    pub chart_height: u32,
    pub max_horizon_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            yahoo_base_url: YahooClient::DEFAULT_BASE_URL.to_string(),
            yahoo_cookie_url: YahooClient::DEFAULT_COOKIE_URL.to_string(),
            user_agent: YahooClient::DEFAULT_USER_AGENT.to_string(),
            chart_width: 1000,
            chart_height: 600,
            max_horizon_days: 365,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value lookup; missing keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            yahoo_base_url: lookup("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
            yahoo_cookie_url: lookup("YAHOO_COOKIE_URL").unwrap_or(defaults.yahoo_cookie_url),
            user_agent: lookup("HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
            chart_width: positive(&lookup, "CHART_WIDTH", defaults.chart_width)?,
            chart_height: positive(&lookup, "CHART_HEIGHT", defaults.chart_height)?,
            max_horizon_days: positive(&lookup, "MAX_HORIZON_DAYS", defaults.max_horizon_days)?,
        })
    }
}

fn positive<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) if v > T::default() => Ok(v),
            _ => Err(ConfigError::InvalidNumber { name, value: raw }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("BIND_ADDRESS", "0.0.0.0:8080"),
            ("YAHOO_COOKIE_URL", "http://127.0.0.1:4000/fc"),
            ("CHART_WIDTH", "800"),
            ("MAX_HORIZON_DAYS", "90"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.yahoo_cookie_url, "http://127.0.0.1:4000/fc");
        assert_eq!(config.yahoo_base_url, YahooClient::DEFAULT_BASE_URL);
        assert_eq!(config.chart_width, 800);
        assert_eq!(config.chart_height, 600);
        assert_eq!(config.max_horizon_days, 90);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[("CHART_HEIGHT", "tall")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                name: "CHART_HEIGHT",
                value: "tall".to_string()
            }
        );
        assert!(Config::from_lookup(lookup_from(&[("MAX_HORIZON_DAYS", "0")])).is_err());
    }
}
