//! The application root and its event loop.
//!
//! One thread owns both schedulers. Two cadences run on it, the alarm poll
//! and the notification poll, plus the one-shot auto-dismiss deadlines the
//! alarm scheduler hands out. Hosts on other threads feed [`Command`]s in and
//! read [`Event`](crate::communication::Event)s out; nothing else is shared.

use std::{
    sync::mpsc::{Receiver, RecvTimeoutError},
    time::Duration as StdDuration,
};

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::{
    alarm::Alarm,
    alarm_scheduler::AlarmScheduler,
    alarm_store::AlarmStore,
    clock::Clock,
    communication::{Command, Event, EventSender},
    config::Config,
    error::{ConfigError, Rejection, ScheduleError},
    notification::{Category, NotificationData, ScheduledNotification},
    notification_scheduler::NotificationScheduler,
    notification_store::NotificationStore,
    records::{CalendarEvent, WeatherReport},
};

#[derive(Debug)]
pub struct App<C> {
    config: Config,
    clock: C,
    alarms: AlarmScheduler,
    notifications: NotificationScheduler,
    events: EventSender,
    last_tick: Option<NaiveDateTime>,
    next_alarm_check: Option<NaiveDateTime>,
    next_notification_check: Option<NaiveDateTime>,
}

impl<C: Clock> App<C> {
    /// loads the alarm file named by `config`; fails only if no path can be worked out
    pub fn new(config: Config, clock: C, events: EventSender) -> Result<Self, ConfigError> {
        let now = clock.now();
        let store = AlarmStore::new(config.alarms_path()?);
        let alarms = AlarmScheduler::new(store, events.clone(), now);
        let notifications = NotificationScheduler::new(
            NotificationStore::new(events.clone()),
            config.weather_notification_time,
        )
        .with_units(config.units);
        log::info!("notification manager initialized");
        Ok(Self {
            config,
            clock,
            alarms,
            notifications,
            events,
            last_tick: None,
            next_alarm_check: None,
            next_notification_check: None,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn alarms(&self) -> &AlarmScheduler {
        &self.alarms
    }

    pub fn alarms_mut(&mut self) -> &mut AlarmScheduler {
        &mut self.alarms
    }

    #[must_use]
    pub const fn notifications(&self) -> &NotificationScheduler {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationScheduler {
        &mut self.notifications
    }

    /// a new alarm with the configured auto-dismiss defaults
    #[must_use]
    pub fn new_alarm(&self, time: NaiveTime) -> Alarm {
        Alarm::new(time, self.clock.now()).with_auto_dismiss(
            self.config.default_auto_dismiss,
            self.config.default_alarm_duration_secs,
        )
    }

    /// applies one command. returns false once the loop should stop.
    /// refused commands are reported as [`Event::CommandRejected`].
    pub fn handle(&mut self, command: Command) -> bool {
        let now = self.clock.now();
        let outcome = match command {
            Command::AddAlarm(alarm) => {
                if self.alarms.add_alarm(alarm.clone()) {
                    Ok(())
                } else {
                    Err(Rejection::DuplicateAlarm(alarm))
                }
            }
            Command::RemoveAlarm(id) => self
                .alarms
                .remove_alarm(&id)
                .then_some(())
                .ok_or(Rejection::UnknownAlarm(id)),
            Command::ToggleAlarm(id) => self
                .alarms
                .toggle_alarm(&id)
                .then_some(())
                .ok_or(Rejection::UnknownAlarm(id)),
            Command::DismissAlarm(id) => {
                // dismissing something that already stopped ringing is fine
                self.alarms.dismiss_alarm(&id);
                Ok(())
            }
            Command::AddNotification {
                title,
                message,
                category,
                data,
            } => {
                self.notifications
                    .store_mut()
                    .add_notification(title, message, category, data, now);
                Ok(())
            }
            Command::RemoveNotification(id) => self
                .notifications
                .store_mut()
                .remove_notification(&id)
                .then_some(())
                .ok_or(Rejection::UnknownNotification(id)),
            Command::ScheduleNotification {
                title,
                message,
                when,
                category,
                data,
            } => {
                self.notifications
                    .schedule_notification(title, message, when, category, data);
                Ok(())
            }
            Command::CancelScheduledNotification(id) => self
                .notifications
                .cancel_scheduled_notification(&id)
                .then_some(())
                .ok_or(Rejection::UnknownScheduledNotification(id)),
            Command::MarkAllAsRead(category) => {
                self.notifications.store_mut().mark_all_as_read(category);
                Ok(())
            }
            Command::ClearNotifications(category) => {
                self.notifications.store_mut().clear_notifications(category);
                Ok(())
            }
            Command::ScheduleWeatherNotification { report, when } => {
                self.schedule_weather(report, when);
                Ok(())
            }
            Command::ScheduleCalendarNotification {
                event,
                minutes_before,
            } => self
                .schedule_calendar(event, minutes_before)
                .map(drop)
                .map_err(Rejection::from),
            Command::Shutdown => return false,
        };
        if let Err(rejection) = outcome {
            log::warn!("command rejected: {rejection}");
            self.events.emit(Event::CommandRejected(rejection));
        }
        true
    }

    /// a report without a city is filed under the configured default city
    pub fn schedule_weather(
        &mut self,
        mut report: WeatherReport,
        when: Option<NaiveDateTime>,
    ) -> ScheduledNotification {
        if !report.has_city() {
            if let Some(city) = &self.config.default_city {
                report.city.clone_from(city);
            }
        }
        let now = self.clock.now();
        self.notifications
            .schedule_weather_notification(report, when, now)
    }

    /// `minutes_before` defaults to the configured reminder lead time
    pub fn schedule_calendar(
        &mut self,
        event: CalendarEvent,
        minutes_before: Option<u32>,
    ) -> Result<ScheduledNotification, ScheduleError> {
        let now = self.clock.now();
        let minutes_before = minutes_before.unwrap_or(self.config.calendar_reminder_minutes);
        self.notifications
            .schedule_calendar_notification(event, minutes_before, now)
    }

    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.tick_at(now);
    }

    /// runs whichever polls are due at `now`. the first call runs both,
    /// and so does the first call after the clock went backwards.
    pub fn tick_at(&mut self, now: NaiveDateTime) {
        if let Some(last) = self.last_tick.filter(|last| now < *last) {
            log::warn!("clock went back from {last} to {now}, polling again");
            self.next_alarm_check = None;
            self.next_notification_check = None;
        }
        self.last_tick = Some(now);

        self.alarms.expire_dismissals(now);

        if self.next_alarm_check.map_or(true, |at| now >= at) {
            for alarm in self.alarms.check_alarms(now) {
                self.announce_alarm(&alarm, now);
            }
            self.next_alarm_check = Some(now + interval(self.config.alarm_check_interval()));
        }

        if self.next_notification_check.map_or(true, |at| now >= at) {
            self.notifications.check_scheduled_notifications(now);
            self.next_notification_check =
                Some(now + interval(self.config.notification_check_interval()));
        }
    }

    /// when the loop next has something to do
    #[must_use]
    pub fn next_wakeup(&self) -> NaiveDateTime {
        [
            self.next_alarm_check,
            self.next_notification_check,
            self.alarms.next_dismissal(),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or_else(|| self.clock.now())
    }

    /// blocks until `Command::Shutdown` arrives or every sender is gone
    pub fn run(&mut self, commands: &Receiver<Command>) {
        log::info!("scheduler loop started");
        loop {
            self.tick();
            // never sleep past one alarm period, the wall clock may jump meanwhile
            let wait = (self.next_wakeup() - self.clock.now())
                .to_std()
                .unwrap_or_default()
                .min(clamp_period(self.config.alarm_check_interval()));
            match commands.recv_timeout(wait) {
                Ok(command) => {
                    if !self.handle(command) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::info!("scheduler loop stopped");
    }

    /// alarms also land in the notification list, the way the tray showed them
    fn announce_alarm(&mut self, alarm: &Alarm, now: NaiveDateTime) {
        let label = if alarm.label.is_empty() {
            String::new()
        } else {
            format!(" - {}", alarm.label)
        };
        let message = format!("Alarm at {}{label} is ringing!", alarm.time.format("%H:%M"));
        self.notifications.store_mut().add_notification(
            "Alarm",
            message,
            Category::Alarm,
            NotificationData::Alarm {
                alarm_id: alarm.id.clone(),
            },
            now,
        );
    }
}

/// a zero period would spin the loop
fn clamp_period(period: StdDuration) -> StdDuration {
    period.clamp(StdDuration::from_secs(1), StdDuration::from_secs(86_400))
}

fn interval(period: StdDuration) -> Duration {
    Duration::from_std(clamp_period(period)).unwrap_or_else(|_| Duration::days(1))
}
