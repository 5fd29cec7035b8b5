#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! Alarm and notification scheduling for the weather & alarm desktop utility.
//!
//! The GUI, the weather http client and theming live elsewhere; this crate is
//! the part with timing semantics. Alarms are polled against the wall clock
//! and fire once per matching minute, notifications can be delivered now or
//! queued for later. Both report back through [`communication::Event`]s.

pub mod alarm;
pub mod alarm_scheduler;
pub mod alarm_store;
pub mod app;
pub mod clock;
pub mod communication;
pub mod config;
pub mod error;
pub mod json_file;
pub mod notes;
pub mod notification;
pub mod notification_scheduler;
pub mod notification_store;
pub mod records;

pub use alarm::Alarm;
pub use alarm_scheduler::AlarmScheduler;
pub use app::App;
pub use communication::{Command, Event, EventSender};
pub use config::Config;
pub use error::Rejection;
pub use notification::{Category, Notification, NotificationData, ScheduledNotification};
pub use notification_scheduler::NotificationScheduler;
pub use notification_store::NotificationStore;
