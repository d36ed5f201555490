//! Global schedulr configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{SchedulrError, SchedulrResult};
use crate::gemini::{DEFAULT_GEMINI_MODEL, GEMINI_API_BASE};
use crate::ics::resolve_tzid;
use crate::ingest::{DEFAULT_MAX_OCCURRENCES, IngestOptions};

pub const DEFAULT_PORT: u16 = 4096;

static DEFAULT_HORIZON: &str = "6months";
static DEFAULT_TIMEOUT: &str = "60s";

fn default_horizon() -> String {
    DEFAULT_HORIZON.to_string()
}

fn default_timeout() -> String {
    DEFAULT_TIMEOUT.to_string()
}

fn default_max_occurrences() -> u16 {
    DEFAULT_MAX_OCCURRENCES
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_base_url() -> String {
    GEMINI_API_BASE.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Configuration at ~/.config/schedulr/config.toml, overridable through
/// `SCHEDULR_*` environment variables.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulrConfig {
    /// IANA zone the week is shown in; the system zone when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default = "default_horizon")]
    pub recurrence_horizon: String,

    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: u16,

    #[serde(default = "default_model")]
    pub gemini_model: String,

    #[serde(default = "default_base_url")]
    pub gemini_base_url: String,

    #[serde(default, skip_serializing)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub request_timeout: String,

    #[serde(default = "default_port")]
    pub server_port: u16,
}

impl Default for SchedulrConfig {
    fn default() -> Self {
        SchedulrConfig {
            timezone: None,
            recurrence_horizon: default_horizon(),
            max_occurrences: default_max_occurrences(),
            gemini_model: default_model(),
            gemini_base_url: default_base_url(),
            gemini_api_key: None,
            request_timeout: default_timeout(),
            server_port: default_port(),
        }
    }
}

impl SchedulrConfig {
    pub fn config_path() -> SchedulrResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SchedulrError::Config("Could not determine config directory".into()))?
            .join("schedulr");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default path, creating a commented file on first run.
    pub fn load() -> SchedulrResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from `path` and `SCHEDULR_*` variables. A missing file is fine.
    pub fn load_from(path: &Path) -> SchedulrResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("SCHEDULR").try_parsing(true))
            .build()
            .map_err(|e| SchedulrError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SchedulrError::Config(e.to_string()))
    }

    /// Apply the conventional Gemini variables on top of the loaded values.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("API_KEY")) {
            self.gemini_api_key = Some(key);
        }
        if let Some(model) = lookup("GEMINI_MODEL").filter(|m| !m.is_empty()) {
            self.gemini_model = model;
        }
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> SchedulrResult<()> {
        let contents = format!(
            "\
# schedulr configuration

# Time zone the week is shown in (defaults to the system zone):
# timezone = \"America/New_York\"

# How far ahead recurring classes are expanded:
# recurrence_horizon = \"{}\"

# Gemini model used for study suggestions (the key comes from GEMINI_API_KEY):
# gemini_model = \"{}\"

# Timeout for requests to the AI service:
# request_timeout = \"{}\"

# Port for schedulr-server:
# server_port = {}
",
            DEFAULT_HORIZON, DEFAULT_GEMINI_MODEL, DEFAULT_TIMEOUT, DEFAULT_PORT
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;

        Ok(())
    }

    /// The viewer's zone: configured, else the system zone, else UTC.
    pub fn timezone(&self) -> SchedulrResult<Tz> {
        if let Some(name) = &self.timezone {
            return resolve_tzid(name)
                .ok_or_else(|| SchedulrError::Config(format!("Unknown time zone '{}'", name)));
        }

        match iana_time_zone::get_timezone() {
            Ok(name) => Ok(resolve_tzid(&name).unwrap_or_else(|| {
                warn!("System time zone '{}' is unknown, using UTC", name);
                chrono_tz::UTC
            })),
            Err(e) => {
                warn!("Could not determine system time zone ({}), using UTC", e);
                Ok(chrono_tz::UTC)
            }
        }
    }

    pub fn recurrence_horizon(&self) -> SchedulrResult<chrono::Duration> {
        let horizon = parse_duration_setting("recurrence_horizon", &self.recurrence_horizon)?;
        chrono::Duration::from_std(horizon)
            .map_err(|e| SchedulrError::Config(format!("recurrence_horizon: {e}")))
    }

    pub fn request_timeout(&self) -> Duration {
        parse_duration_setting("request_timeout", &self.request_timeout).unwrap_or_else(|e| {
            warn!("{}, using {}", e, DEFAULT_TIMEOUT);
            crate::gemini::DEFAULT_REQUEST_TIMEOUT
        })
    }

    /// Ingestion options anchored at the current instant.
    pub fn ingest_options(&self) -> SchedulrResult<IngestOptions> {
        Ok(IngestOptions {
            horizon: self.recurrence_horizon()?,
            timezone: self.timezone()?,
            max_occurrences: self.max_occurrences,
            ..IngestOptions::default()
        })
    }
}

fn parse_duration_setting(name: &str, value: &str) -> SchedulrResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| SchedulrError::Config(format!("Invalid {} '{}': {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SchedulrConfig::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.max_occurrences, 1000);
        assert_eq!(config.server_port, DEFAULT_PORT);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        let horizon = config.recurrence_horizon().unwrap();
        assert!(horizon > chrono::Duration::days(180) && horizon < chrono::Duration::days(186));
    }

    #[test]
    fn test_default_file_is_valid_and_commented() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        SchedulrConfig::create_default_config(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("# recurrence_horizon = \"6months\""));

        let config = SchedulrConfig::load_from(&path).unwrap();
        assert_eq!(config.recurrence_horizon, "6months");
    }

    #[test]
    fn test_unwritable_default_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let result = SchedulrConfig::create_default_config(&blocker.join("config.toml"));
        assert!(matches!(result, Err(SchedulrError::Io(_))));
    }

    #[test]
    fn test_file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "timezone = \"Europe/Berlin\"\nrecurrence_horizon = \"30days\"\nserver_port = 8080\n",
        )
        .unwrap();

        let config = SchedulrConfig::load_from(&path).unwrap();
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.recurrence_horizon().unwrap(), chrono::Duration::days(30));
        assert_eq!(config.server_port, 8080);
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let config = SchedulrConfig {
            timezone: Some("Mars/Olympus".into()),
            recurrence_horizon: "soon".into(),
            ..SchedulrConfig::default()
        };
        assert!(matches!(config.timezone(), Err(SchedulrError::Config(_))));
        assert!(matches!(config.recurrence_horizon(), Err(SchedulrError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("API_KEY", "fallback"), ("GEMINI_MODEL", "gemini-pro")].into();
        let mut config = SchedulrConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.gemini_api_key.as_deref(), Some("fallback"));
        assert_eq!(config.gemini_model, "gemini-pro");

        let env: HashMap<&str, &str> = [("API_KEY", "fallback"), ("GEMINI_API_KEY", "primary")].into();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.gemini_api_key.as_deref(), Some("primary"));
    }
}
