use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::{
    config::Units,
    error::ScheduleError,
    notification::{Category, NotificationData, ScheduledNotification},
    notification_store::NotificationStore,
    records::{CalendarEvent, WeatherReport},
};

pub const DEFAULT_REMINDER_MINUTES: u32 = 15;

/// Deferred delivery on top of a [`NotificationStore`].
///
/// Requests wait in the store's pending queue until a poll observes them as
/// due. There is no catch-up: anything overdue is delivered once, on the
/// first poll that sees it.
#[derive(Debug)]
pub struct NotificationScheduler {
    store: NotificationStore,
    weather_time: NaiveTime,
    units: Units,
}

impl NotificationScheduler {
    /// forecasts default to being delivered at `weather_time` the next day
    #[must_use]
    pub const fn new(store: NotificationStore, weather_time: NaiveTime) -> Self {
        Self {
            store,
            weather_time,
            units: Units::Metric,
        }
    }

    /// units the weather reports arrive in
    #[must_use]
    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NotificationStore {
        &mut self.store
    }

    pub fn schedule_notification(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        when: NaiveDateTime,
        category: Category,
        data: NotificationData,
    ) -> ScheduledNotification {
        let scheduled = ScheduledNotification {
            id: self.store.make_id(when),
            title: title.into(),
            message: message.into(),
            when,
            category,
            data,
        };
        log::info!("notification scheduled: {} at {when}", scheduled.title);
        self.store.push_pending(scheduled.clone());
        scheduled
    }

    pub fn cancel_scheduled_notification(&mut self, id: &str) -> bool {
        match self.store.cancel_pending(id) {
            Some(cancelled) => {
                log::info!("scheduled notification cancelled: {}", cancelled.title);
                true
            }
            None => false,
        }
    }

    /// delivers everything due at `now` in the order it was scheduled,
    /// returns how many went out
    pub fn check_scheduled_notifications(&mut self, now: NaiveDateTime) -> usize {
        let due = self.store.take_due(now);
        let count = due.len();
        for scheduled in due {
            self.store.add_notification(
                scheduled.title,
                scheduled.message,
                scheduled.category,
                scheduled.data,
                now,
            );
        }
        if count > 0 {
            log::debug!("delivered {count} scheduled notifications");
        }
        count
    }

    /// without `when` the forecast goes out the next morning
    pub fn schedule_weather_notification(
        &mut self,
        report: WeatherReport,
        when: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> ScheduledNotification {
        let when = when.unwrap_or_else(|| next_day_at(now, self.weather_time));
        let title = format!("Weather Forecast for {}", report.city);
        let message = format!(
            "Tomorrow's weather: {}, {}{}",
            report.description,
            report.temperature,
            self.units.temperature_suffix()
        );
        self.schedule_notification(
            title,
            message,
            when,
            Category::Weather,
            NotificationData::Weather(report),
        )
    }

    /// reminds `minutes_before` the event starts. reminders that would
    /// already be overdue are refused rather than delivered late.
    pub fn schedule_calendar_notification(
        &mut self,
        event: CalendarEvent,
        minutes_before: u32,
        now: NaiveDateTime,
    ) -> Result<ScheduledNotification, ScheduleError> {
        let Some(start) = event.datetime() else {
            log::error!("cannot schedule calendar notification without date and time");
            return Err(ScheduleError::MissingEventTime { title: event.title });
        };
        let when = start - Duration::minutes(i64::from(minutes_before));
        if when < now {
            log::warn!("not scheduling notification for past event: {}", event.title);
            return Err(ScheduleError::PastDue {
                title: event.title,
                when,
            });
        }
        let title = format!("Upcoming Event: {}", event.title);
        let message = format!("Event starts in {minutes_before} minutes");
        Ok(self.schedule_notification(
            title,
            message,
            when,
            Category::Calendar,
            NotificationData::Calendar(event),
        ))
    }
}

fn next_day_at(now: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    let tomorrow = now.date().succ_opt().unwrap_or_else(|| now.date());
    tomorrow.and_time(time)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::communication::{Event, EventSender};
    use chrono::NaiveDate;
    use std::sync::mpsc::channel;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid datetime")
    }

    fn seven() -> NaiveTime {
        NaiveTime::from_hms_opt(7, 0, 0).expect("time")
    }

    fn scheduler() -> NotificationScheduler {
        NotificationScheduler::new(NotificationStore::new(EventSender::detached()), seven())
    }

    #[test]
    fn check_scheduled_notifications__should_deliver_due_once() {
        // Given
        let (tx, rx) = channel();
        let mut scheduler = NotificationScheduler::new(NotificationStore::new(tx.into()), seven());
        let scheduled = scheduler.schedule_notification(
            "Tea",
            "Kettle",
            at(1, 15, 0),
            Category::General,
            NotificationData::None,
        );

        // When
        let early = scheduler.check_scheduled_notifications(at(1, 14, 59));
        let early_events = rx.try_iter().count();
        let delivered = scheduler.check_scheduled_notifications(at(1, 15, 0));
        let again = scheduler.check_scheduled_notifications(at(1, 15, 1));

        // Then
        assert_eq!(early, 0);
        assert_eq!(early_events, 0);
        assert_eq!(delivered, 1);
        assert_eq!(again, 0);
        assert!(scheduler.store().pending().is_empty());
        let added: Vec<_> = rx
            .try_iter()
            .filter_map(|event| match event {
                Event::NotificationAdded(n) => Some(n),
                _ => None,
            })
            .collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].title, scheduled.title);
        assert_eq!(added[0].timestamp, at(1, 15, 0));
    }

    #[test]
    fn check_scheduled_notifications__should_deliver_all_due_in_order() {
        let mut scheduler = scheduler();
        for (title, when) in [("b", at(1, 9, 0)), ("a", at(1, 8, 0)), ("c", at(2, 8, 0))] {
            scheduler.schedule_notification(
                title,
                "",
                when,
                Category::General,
                NotificationData::None,
            );
        }

        // hours late, still delivered exactly once
        let delivered = scheduler.check_scheduled_notifications(at(1, 23, 0));

        let titles: Vec<String> = scheduler
            .store()
            .get_notifications(None, false)
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(delivered, 2);
        assert_eq!(titles, vec!["b", "a"]);
        assert_eq!(scheduler.store().pending().len(), 1);
    }

    #[test]
    fn cancel_scheduled_notification__should_remove_from_queue() {
        let mut scheduler = scheduler();
        let scheduled = scheduler.schedule_notification(
            "Tea",
            "Kettle",
            at(1, 15, 0),
            Category::General,
            NotificationData::None,
        );

        assert!(scheduler.cancel_scheduled_notification(&scheduled.id));
        assert!(!scheduler.cancel_scheduled_notification(&scheduled.id));
        assert_eq!(scheduler.check_scheduled_notifications(at(1, 16, 0)), 0);
    }

    #[test]
    fn schedule_weather_notification__should_default_to_next_morning() {
        let mut scheduler = scheduler();
        let report = WeatherReport::new("Oslo", -3.5, "light snow");

        let scheduled = scheduler.schedule_weather_notification(report.clone(), None, at(1, 14, 0));

        assert_eq!(scheduled.when, at(2, 7, 0));
        assert_eq!(scheduled.category, Category::Weather);
        assert_eq!(scheduled.title, "Weather Forecast for Oslo");
        assert_eq!(scheduled.message, "Tomorrow's weather: light snow, -3.5°C");
        assert_eq!(scheduled.data, NotificationData::Weather(report));
    }

    #[test]
    fn schedule_weather_notification__should_write_temperature_in_units() {
        let mut scheduler = scheduler().with_units(Units::Imperial);

        let scheduled = scheduler.schedule_weather_notification(
            WeatherReport::new("Boston", 41.0, "windy"),
            None,
            at(1, 14, 0),
        );

        assert_eq!(scheduled.message, "Tomorrow's weather: windy, 41°F");
    }

    #[test]
    fn schedule_weather_notification__should_roll_over_month() {
        let mut scheduler = scheduler();
        let now = NaiveDate::from_ymd_opt(2024, 1, 31)
            .and_then(|d| d.and_hms_opt(23, 59, 0))
            .expect("datetime");
        let report = WeatherReport::new("Rome", 12.0, "clear");

        let scheduled = scheduler.schedule_weather_notification(report, None, now);

        assert_eq!(
            Some(scheduled.when),
            NaiveDate::from_ymd_opt(2024, 2, 1).and_then(|d| d.and_hms_opt(7, 0, 0))
        );
    }

    #[test]
    fn schedule_weather_notification__should_keep_explicit_time() {
        let mut scheduler = scheduler();

        let scheduled = scheduler.schedule_weather_notification(
            WeatherReport::new("Rome", 12.0, "clear"),
            Some(at(1, 18, 30)),
            at(1, 14, 0),
        );

        assert_eq!(scheduled.when, at(1, 18, 30));
    }

    #[test]
    fn schedule_calendar_notification__should_remind_before_event() {
        let mut scheduler = scheduler();
        let event = CalendarEvent::new(
            "Dentist",
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            NaiveTime::from_hms_opt(16, 0, 0).expect("time"),
        );

        let scheduled = scheduler
            .schedule_calendar_notification(event, DEFAULT_REMINDER_MINUTES, at(1, 14, 0))
            .expect("scheduled");

        assert_eq!(scheduled.when, at(1, 15, 45));
        assert_eq!(scheduled.title, "Upcoming Event: Dentist");
        assert_eq!(scheduled.message, "Event starts in 15 minutes");
        assert_eq!(scheduler.store().pending().len(), 1);
    }

    #[test]
    fn schedule_calendar_notification__should_reject_past_due() {
        // Given
        let mut scheduler = scheduler();
        let event = CalendarEvent::new(
            "Standup",
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            NaiveTime::from_hms_opt(14, 10, 0).expect("time"),
        );

        // When
        let result = scheduler.schedule_calendar_notification(event, 15, at(1, 14, 0));

        // Then
        assert_eq!(
            result,
            Err(ScheduleError::PastDue {
                title: "Standup".to_string(),
                when: at(1, 13, 55),
            })
        );
        assert!(scheduler.store().pending().is_empty());
    }

    #[test]
    fn schedule_calendar_notification__should_reject_missing_time() {
        let mut scheduler = scheduler();
        let event = CalendarEvent {
            title: "Someday".to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2),
            time: None,
        };

        let result = scheduler.schedule_calendar_notification(event, 15, at(1, 14, 0));

        assert!(matches!(result, Err(ScheduleError::MissingEventTime { .. })));
        assert!(scheduler.store().pending().is_empty());
    }
}
