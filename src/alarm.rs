use std::fmt;

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// seconds a fired alarm keeps ringing before it dismisses itself
pub const DEFAULT_ALARM_DURATION: u32 = 60;

#[inline]
#[must_use]
pub const fn always_true() -> bool {
    true
}

#[inline]
#[must_use]
pub const fn default_duration() -> u32 {
    DEFAULT_ALARM_DURATION
}

/// represents a daily alarm.
/// only the hour and minute of `time` matter, there is no date or timezone.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Alarm {
    /// filled in on load when an older file lacks it
    #[serde(default)]
    pub id: String,
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,
    #[serde(default = "always_true")]
    pub auto_dismiss: bool,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default = "always_true")]
    pub enabled: bool,
    #[serde(default)]
    pub label: String,
}

impl Alarm {
    /// a new enabled alarm that auto dismisses after the default duration.
    /// `created` only feeds the id.
    #[must_use]
    pub fn new(time: NaiveTime, created: NaiveDateTime) -> Self {
        let time = to_minute(time);
        Self {
            id: Self::make_id(time, created),
            time,
            auto_dismiss: true,
            duration: DEFAULT_ALARM_DURATION,
            enabled: true,
            label: String::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// `duration` is clamped to at least one second
    #[must_use]
    pub fn with_auto_dismiss(mut self, auto_dismiss: bool, duration: u32) -> Self {
        self.auto_dismiss = auto_dismiss;
        self.duration = duration.max(1);
        self
    }

    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn make_id(time: NaiveTime, created: NaiveDateTime) -> String {
        format!("{}_{}", time.format("%H:%M"), created.format("%Y%m%d%H%M%S"))
    }

    /// two alarms clash when they ring at the same hour and minute,
    /// whatever their ids or labels
    #[must_use]
    pub fn is_duplicate_of(&self, other: &Self) -> bool {
        self.time.hour() == other.time.hour() && self.time.minute() == other.time.minute()
    }

    #[must_use]
    pub fn is_due_at(&self, now: NaiveTime) -> bool {
        self.time.hour() == now.hour() && self.time.minute() == now.minute()
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Alarm({}, enabled={}, label={})",
            self.time.format("%H:%M"),
            self.enabled,
            self.label
        )
    }
}

fn to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// parses a 24 hour `HH:MM` string, `H:MM` is accepted too
#[must_use]
pub fn parse_hh_mm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// serializes a `NaiveTime` as a zero padded 24 hour `HH:MM` string
pub mod hh_mm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_hh_mm(&s).ok_or_else(|| D::Error::custom(format!("invalid alarm time {s:?}")))
    }
}
