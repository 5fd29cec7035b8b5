use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::alarm::Alarm;

/// failures reading or writing one of the json data files
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("couldn't access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// a scheduling request that was refused
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("reminder for {title:?} would be due at {when}, which has already passed")]
    PastDue { title: String, when: NaiveDateTime },
    #[error("event {title:?} has no date or time")]
    MissingEventTime { title: String },
}

/// why the loop refused a command
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Rejection {
    #[error("an alarm is already set for {}", .0.time.format("%H:%M"))]
    DuplicateAlarm(Alarm),
    #[error("no alarm with id {0}")]
    UnknownAlarm(String),
    #[error("no notification with id {0}")]
    UnknownNotification(String),
    #[error("no scheduled notification with id {0}")]
    UnknownScheduledNotification(String),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't access config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("couldn't determine a home directory for config and data files")]
    NoHomeDirectory,
}
