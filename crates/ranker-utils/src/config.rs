//! Process-level configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event, for log collectors
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "stock-ranker".to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Read `APP_ENV` and `LOG_FORMAT` from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; unknown values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(env) = lookup("APP_ENV") {
            config.environment = env;
        }
        if let Some(format) = lookup("LOG_FORMAT").and_then(|v| v.parse().ok()) {
            config.log_format = format;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" Pretty ".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(|name| match name {
            "APP_ENV" => Some("production".to_string()),
            "LOG_FORMAT" => Some("json".to_string()),
            _ => None,
        });

        assert_eq!(config.environment, "production");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.app_name, "stock-ranker");
    }

    #[test]
    fn test_unknown_log_format_keeps_default() {
        let config = Config::from_lookup(|name| (name == "LOG_FORMAT").then(|| "yaml".to_string()));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["log_format"], "pretty");
    }
}
