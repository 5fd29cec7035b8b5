use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::{
    alarm::DEFAULT_ALARM_DURATION, error::ConfigError,
    notification_scheduler::DEFAULT_REMINDER_MINUTES,
};

const APP_NAME: &str = "weather_alarm";

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Standard,
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// how temperatures reported in these units are written
    #[must_use]
    pub const fn temperature_suffix(self) -> &'static str {
        match self {
            Self::Standard => " K",
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }
}

/// Everything the application root used to keep in process-wide globals.
/// Missing keys in the file take their defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub alarm_check_interval_secs: u64,
    pub notification_check_interval_secs: u64,
    pub default_alarm_duration_secs: u32,
    pub default_auto_dismiss: bool,
    pub calendar_reminder_minutes: u32,
    #[serde(with = "toml_datetime_compat")]
    pub weather_notification_time: NaiveTime,
    pub alarms_file: Option<PathBuf>,
    pub notes_file: Option<PathBuf>,
    pub api_key: Option<String>,
    pub default_city: Option<String>,
    pub units: Units,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alarm_check_interval_secs: 10,
            notification_check_interval_secs: 60,
            default_alarm_duration_secs: DEFAULT_ALARM_DURATION,
            default_auto_dismiss: true,
            calendar_reminder_minutes: DEFAULT_REMINDER_MINUTES,
            weather_notification_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
            alarms_file: None,
            notes_file: None,
            api_key: None,
            default_city: None,
            units: Units::Metric,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// falls back to the defaults (and logs why) when the file is missing or broken
    #[must_use]
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Self::default();
        }
        Self::try_load(path).unwrap_or_else(|e| {
            log::error!("{e}, using default config");
            Self::default()
        })
    }

    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let config = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&config)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, config).map_err(io_error)
    }

    /// api key from the environment wins over the file, like the weather service expects
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("OPENWEATHER_API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        self
    }

    /// auto-dismiss flag and duration for a new alarm. asking for a
    /// duration turns auto-dismiss on even when it is off by default.
    #[must_use]
    pub fn alarm_dismissal(&self, duration: Option<u32>) -> (bool, u32) {
        (
            duration.is_some() || self.default_auto_dismiss,
            duration.unwrap_or(self.default_alarm_duration_secs),
        )
    }

    /// a copy that is safe to print
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn alarm_check_interval(&self) -> Duration {
        Duration::from_secs(self.alarm_check_interval_secs)
    }

    #[must_use]
    pub const fn notification_check_interval(&self) -> Duration {
        Duration::from_secs(self.notification_check_interval_secs)
    }

    pub fn alarms_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.alarms_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_path()?.join("alarms.json")),
        }
    }

    pub fn notes_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.notes_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_path()?.join("notes.json")),
        }
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = project_dirs()?.config_dir().to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    pub fn data_path() -> Result<PathBuf, ConfigError> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    #[must_use]
    pub fn is_config_present() -> bool {
        Self::config_path().is_ok_and(|path| path.exists())
    }
}

fn project_dirs() -> Result<directories::ProjectDirs, ConfigError> {
    directories::ProjectDirs::from("", "", APP_NAME).ok_or(ConfigError::NoHomeDirectory)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn save__should_round_trip_through_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config").join("config.toml");
        let config = Config {
            alarm_check_interval_secs: 5,
            weather_notification_time: NaiveTime::from_hms_opt(6, 30, 0).expect("time"),
            default_city: Some("Lisbon".to_string()),
            units: Units::Imperial,
            alarms_file: Some(dir.path().join("alarms.json")),
            ..Config::default()
        };

        config.save(&path).expect("save");

        assert_eq!(Config::try_load(&path).expect("load"), config);
    }

    #[test]
    fn load__should_fill_missing_keys_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_city = \"Oslo\"\n").expect("write");

        let config = Config::load(&path);

        assert_eq!(config.default_city.as_deref(), Some("Oslo"));
        assert_eq!(config.alarm_check_interval(), Duration::from_secs(10));
        assert_eq!(config.notification_check_interval(), Duration::from_secs(60));
        assert_eq!(
            config.weather_notification_time,
            NaiveTime::from_hms_opt(7, 0, 0).expect("time")
        );
    }

    #[test]
    fn load__should_use_defaults_for_broken_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "alarm_check_interval_secs = \"soon\"").expect("write");

        assert_eq!(Config::load(&path), Config::default());
        assert!(matches!(Config::try_load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load__should_use_defaults_for_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");

        assert_eq!(Config::load(&dir.path().join("nope.toml")), Config::default());
    }

    #[test]
    fn alarm_dismissal__should_turn_on_for_explicit_duration() {
        let config = Config {
            default_auto_dismiss: false,
            ..Config::default()
        };

        assert_eq!(config.alarm_dismissal(None), (false, 60));
        assert_eq!(config.alarm_dismissal(Some(300)), (true, 300));
        assert_eq!(Config::default().alarm_dismissal(None), (true, 60));
    }

    #[test]
    fn redacted__should_hide_api_key_only() {
        let config = Config {
            api_key: Some("secret".to_string()),
            default_city: Some("Oslo".to_string()),
            ..Config::default()
        };

        let redacted = config.redacted();

        assert_eq!(redacted.api_key.as_deref(), Some("***"));
        assert_eq!(redacted.default_city, config.default_city);
        assert_eq!(Config::default().redacted().api_key, None);
    }

    #[test]
    fn alarms_path__should_prefer_override() {
        let config = Config {
            alarms_file: Some(PathBuf::from("/tmp/custom.json")),
            ..Config::default()
        };

        assert_eq!(
            config.alarms_path().expect("path"),
            PathBuf::from("/tmp/custom.json")
        );
    }
}
