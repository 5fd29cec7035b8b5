use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::records::{CalendarEvent, WeatherReport};

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Alarm,
    Weather,
    Calendar,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Alarm => "alarm",
            Self::Weather => "weather",
            Self::Calendar => "calendar",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "alarm" => Ok(Self::Alarm),
            "weather" => Ok(Self::Weather),
            "calendar" => Ok(Self::Calendar),
            other => Err(format!("unknown notification category {other:?}")),
        }
    }
}

/// whatever produced the notification, kept so the host can link back to it
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NotificationData {
    #[default]
    None,
    Alarm {
        alarm_id: String,
    },
    Weather(WeatherReport),
    Calendar(CalendarEvent),
}

/// a delivered notification
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub category: Category,
    pub timestamp: NaiveDateTime,
    pub read: bool,
    pub data: NotificationData,
}

impl Notification {
    /// read state only ever moves forward
    pub fn mark_as_read(&mut self) {
        self.read = true;
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.title,
            self.message,
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// a notification waiting in the pending queue for its due time
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScheduledNotification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub when: NaiveDateTime,
    pub category: Category,
    pub data: NotificationData,
}

impl ScheduledNotification {
    #[must_use]
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.when <= now
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn category__should_parse_case_insensitively() {
        assert_eq!("Weather".parse::<Category>(), Ok(Category::Weather));
        assert_eq!(" alarm ".parse::<Category>(), Ok(Category::Alarm));
        assert!("sports".parse::<Category>().is_err());
    }

    #[test]
    fn category__should_serialize_lowercase() {
        let json = serde_json::to_string(&Category::Calendar).expect("serialize");

        assert_eq!(json, "\"calendar\"");
    }
}
