use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::status::StatusFilter;
use crate::error::{AppError, AppResult};

const APP_DIRECTORY: &str = "ticketdesk";
const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const API_URL_ENV: &str = "TICKETDESK_API_URL";
pub const TIMEOUT_ENV: &str = "TICKETDESK_TIMEOUT_SECS";

/// Values written by `config init`; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub default_status_filter: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        let path = config_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(&path, data)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub default_status_filter: StatusFilter,
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Self::resolve(
            stored,
            env::var(API_URL_ENV).ok(),
            env::var(TIMEOUT_ENV).ok(),
        )
    }

    fn resolve(
        stored: StoredConfig,
        env_url: Option<String>,
        env_timeout: Option<String>,
    ) -> AppResult<Self> {
        let api_base_url = env_url
            .filter(|url| !url.trim().is_empty())
            .or(stored.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(AppError::Configuration(format!(
                "API base URL must start with http:// or https://, got '{api_base_url}'"
            )));
        }

        let timeout_secs = match env_timeout {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::Configuration(format!("{TIMEOUT_ENV} must be a number of seconds"))
            })?,
            None => stored.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let default_status_filter = match stored.default_status_filter.as_deref() {
            Some(raw) => StatusFilter::from_str(raw).ok_or_else(|| {
                AppError::Configuration(format!("unknown default status filter '{raw}'"))
            })?,
            None => StatusFilter::All,
        };

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(timeout_secs),
            default_status_filter,
        })
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIRECTORY))
        .ok_or_else(|| AppError::Configuration("no user config directory available".to_string()))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::TicketStatus;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::resolve(StoredConfig::default(), None, None).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.default_status_filter, StatusFilter::All);
    }

    #[test]
    fn environment_overrides_stored_values() {
        let stored = StoredConfig {
            api_base_url: Some("https://stored.example.com/api".to_string()),
            request_timeout_secs: Some(5),
            default_status_filter: Some("In Progress".to_string()),
        };
        let config = AppConfig::resolve(
            stored,
            Some("https://env.example.com/api/".to_string()),
            Some("12".to_string()),
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://env.example.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(12));
        assert_eq!(
            config.default_status_filter,
            StatusFilter::Only(TicketStatus::InProgress)
        );
    }

    #[test]
    fn rejects_url_without_scheme() {
        let err = AppConfig::resolve(StoredConfig::default(), Some("localhost:4000".into()), None)
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
