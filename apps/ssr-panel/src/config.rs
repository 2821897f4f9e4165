use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::services::checkin_service::CheckinPolicy;

/// Upper bound for a single check-in reward (1 TB).
pub const MAX_CHECKIN_MB: i64 = 1024 * 1024;
/// Upper bound for hour-valued settings (ten years).
pub const MAX_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    pub database_url: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Smallest check-in reward in MB
    #[serde(default = "default_checkin_min")]
    pub checkin_min: i64,
    /// Largest check-in reward in MB
    #[serde(default = "default_checkin_max")]
    pub checkin_max: i64,
    /// Hours between two check-ins
    #[serde(default = "default_checkin_time")]
    pub checkin_time: i64,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Overrides the scheme and host taken from the request when building download links
    pub public_url: Option<String>,
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: String,
}

fn default_listen_port() -> u16 {
    8080
}

fn default_checkin_min() -> i64 {
    1
}

fn default_checkin_max() -> i64 {
    50
}

fn default_checkin_time() -> i64 {
    22
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

fn default_downloads_dir() -> String {
    "apps/ssr-panel/downloads".to_string()
}

impl PanelConfig {
    pub fn load() -> Result<Self> {
        let config_paths = ["/etc/ssr-panel/panel.toml", "./panel.toml"];

        for path in config_paths {
            if let Ok(contents) = fs::read_to_string(path) {
                tracing::info!("Loading config from {}", path);
                return Self::from_toml_str(&contents)
                    .with_context(|| format!("Invalid config file {}", path));
            }
        }

        tracing::info!("Loading config from environment");
        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL must be set in .env")?,
            listen_port: env_or("PANEL_PORT", default_listen_port())?,
            checkin_min: env_or("CHECKIN_MIN", default_checkin_min())?,
            checkin_max: env_or("CHECKIN_MAX", default_checkin_max())?,
            checkin_time: env_or("CHECKIN_TIME", default_checkin_time())?,
            session_ttl_hours: env_or("SESSION_TTL_HOURS", default_session_ttl_hours())?,
            public_url: std::env::var("PUBLIC_URL").ok().filter(|v| !v.trim().is_empty()),
            downloads_dir: std::env::var("DOWNLOADS_DIR")
                .unwrap_or_else(|_| default_downloads_dir()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.checkin_min < 0 || self.checkin_min > self.checkin_max {
            return Err(anyhow::anyhow!(
                "checkin range is invalid: min={} max={}",
                self.checkin_min,
                self.checkin_max
            ));
        }
        if self.checkin_max > MAX_CHECKIN_MB {
            return Err(anyhow::anyhow!(
                "checkin_max must be at most {} MB, got {}",
                MAX_CHECKIN_MB,
                self.checkin_max
            ));
        }
        if !(1..=MAX_HOURS).contains(&self.checkin_time) {
            return Err(anyhow::anyhow!(
                "checkin_time must be between 1 and {} hours",
                MAX_HOURS
            ));
        }
        if !(1..=MAX_HOURS).contains(&self.session_ttl_hours) {
            return Err(anyhow::anyhow!(
                "session_ttl_hours must be between 1 and {} hours",
                MAX_HOURS
            ));
        }
        Ok(())
    }

    pub fn checkin_policy(&self) -> CheckinPolicy {
        CheckinPolicy::new(
            self.checkin_min,
            self.checkin_max,
            Duration::hours(self.checkin_time),
        )
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a number, got '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl PanelConfig {
    pub fn for_tests(checkin_min: i64, checkin_max: i64) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            listen_port: 0,
            checkin_min,
            checkin_max,
            checkin_time: 22,
            session_ttl_hours: 1,
            public_url: None,
            downloads_dir: default_downloads_dir(),
        }
    }
}
