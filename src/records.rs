//! Plain records handed to us by the weather service and the calendar.
//!
//! They only carry what the notification helpers read. Missing text fields
//! fall back to the same placeholders the forecast and event dialogs show.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

fn unknown() -> String {
    "Unknown".to_string()
}

fn untitled() -> String {
    "Untitled Event".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    #[serde(default = "unknown")]
    pub city: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// in whatever units the report was requested in
    #[serde(default)]
    pub temperature: f64,
    #[serde(default = "unknown")]
    pub description: String,
    #[serde(default)]
    pub humidity: Option<u8>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
}

impl WeatherReport {
    #[must_use]
    pub fn new(city: impl Into<String>, temperature: f64, description: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: None,
            lat: None,
            lon: None,
            temperature,
            description: description.into(),
            humidity: None,
            wind_speed: None,
        }
    }

    /// false for the placeholder a report without a city gets
    #[must_use]
    pub fn has_city(&self) -> bool {
        !self.city.trim().is_empty() && self.city != unknown()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default = "untitled")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<NaiveTime>,
}

impl CalendarEvent {
    #[must_use]
    pub fn new(title: impl Into<String>, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            date: Some(date),
            time: Some(time),
        }
    }

    /// start of the event, seconds dropped. `None` unless both date and time are set.
    #[must_use]
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        let time = self.time?;
        let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)?;
        Some(self.date?.and_time(time))
    }
}
