use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::services::DEFAULT_CAMPAIGN_WINDOW_DAYS;

pub const CAMPAIGN_WINDOW_MAX_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub data_file: PathBuf,
    pub campaign_window_days: i64,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            data_file: PathBuf::from("./data/campaigns.json"),
            campaign_window_days: DEFAULT_CAMPAIGN_WINDOW_DAYS,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let defaults = Config::default();
        let config = Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| defaults.server_port.to_string())
                .parse()?,
            data_file: env::var("DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            campaign_window_days: env::var("CAMPAIGN_WINDOW_DAYS")
                .unwrap_or_else(|_| defaults.campaign_window_days.to_string())
                .parse()?,
            log_format: parse_log_format(
                &env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            )?,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            anyhow::bail!("SERVER_PORT must be greater than 0");
        }
        if !(1..=CAMPAIGN_WINDOW_MAX_DAYS).contains(&self.campaign_window_days) {
            anyhow::bail!(
                "CAMPAIGN_WINDOW_DAYS must be between 1 and {}",
                CAMPAIGN_WINDOW_MAX_DAYS
            );
        }
        if self.data_file.as_os_str().is_empty() {
            anyhow::bail!("DATA_FILE is empty");
        }
        Ok(())
    }

    /// Clamped to the range `validate` accepts.
    pub fn campaign_window(&self) -> chrono::Duration {
        chrono::Duration::days(
            self.campaign_window_days
                .clamp(1, CAMPAIGN_WINDOW_MAX_DAYS),
        )
    }
}

fn parse_log_format(raw: &str) -> anyhow::Result<LogFormat> {
    match raw.trim().to_lowercase().as_str() {
        "" | "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => anyhow::bail!("LOG_FORMAT must be 'text' or 'json', got '{}'", other),
    }
}
