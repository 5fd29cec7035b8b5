//! Messages crossing the boundary between the scheduling core and whatever
//! hosts it (tray, window, the cli).
//!
//! The core only ever talks outward through an [`EventSender`]; the host
//! talks inward by sending [`Command`]s to the loop in [`crate::app`].

use std::sync::mpsc::Sender;

use chrono::NaiveDateTime;

use crate::{
    alarm::Alarm,
    error::Rejection,
    notification::{Category, Notification, NotificationData},
    records::{CalendarEvent, WeatherReport},
};

/// emitted by the core
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    AlarmsChanged(Vec<Alarm>),
    AlarmTriggered(Alarm),
    /// the alarm stopped ringing, by timeout, user action or minute rollover
    AlarmDismissed(String),
    NotificationAdded(Notification),
    NotificationRemoved(String),
    NotificationsUpdated(Vec<Notification>),
    /// a [`Command`] the core refused, for the host to tell the user about
    CommandRejected(Rejection),
}

/// requests from the host, applied on the loop thread
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddAlarm(Alarm),
    RemoveAlarm(String),
    ToggleAlarm(String),
    DismissAlarm(String),
    AddNotification {
        title: String,
        message: String,
        category: Category,
        data: NotificationData,
    },
    RemoveNotification(String),
    ScheduleNotification {
        title: String,
        message: String,
        when: NaiveDateTime,
        category: Category,
        data: NotificationData,
    },
    CancelScheduledNotification(String),
    MarkAllAsRead(Option<Category>),
    ClearNotifications(Option<Category>),
    ScheduleWeatherNotification {
        report: WeatherReport,
        when: Option<NaiveDateTime>,
    },
    ScheduleCalendarNotification {
        event: CalendarEvent,
        minutes_before: Option<u32>,
    },
    Shutdown,
}

/// outbound half of the event channel.
/// a host that stopped listening is not an error for the core.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: Option<Sender<Event>>,
}

impl EventSender {
    #[must_use]
    pub const fn new(sender: Sender<Event>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// drops every event
    #[must_use]
    pub const fn detached() -> Self {
        Self { sender: None }
    }

    pub fn emit(&self, event: Event) {
        if let Some(sender) = &self.sender {
            if let Err(e) = sender.send(event) {
                log::debug!("no listener for event {:?}", e.0);
            }
        }
    }
}

impl From<Sender<Event>> for EventSender {
    fn from(sender: Sender<Event>) -> Self {
        Self::new(sender)
    }
}
