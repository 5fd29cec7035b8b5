//! Owns the alarm list and decides when alarms ring.
//!
//! Alarms are checked by polling, see [`AlarmScheduler::check_alarms`]. Once
//! an alarm fires its id sits in the ringing set until one of:
//!
//! - its auto-dismiss deadline passes ([`AlarmScheduler::expire_dismissals`])
//! - the user dismisses, disables or deletes it
//! - for alarms without auto-dismiss, the clock leaves the minute it fired in
//!
//! An alarm never fires twice in the same minute, so a short auto-dismiss
//! duration does not make it ring again on the next poll.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDateTime};

use crate::{
    alarm::Alarm,
    alarm_store::AlarmStore,
    clock::truncate_to_minute,
    communication::{Event, EventSender},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ringing {
    fired_at: NaiveDateTime,
    /// `None` when the alarm waits for the user (or the next minute)
    dismiss_at: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub struct AlarmScheduler {
    alarms: Vec<Alarm>,
    store: AlarmStore,
    events: EventSender,
    ringing: BTreeMap<String, Ringing>,
    /// minute each alarm last fired in, only kept for the current minute
    last_fired: HashMap<String, NaiveDateTime>,
}

impl AlarmScheduler {
    /// loads whatever the store holds and announces it with `AlarmsChanged`
    #[must_use]
    pub fn new(store: AlarmStore, events: EventSender, now: NaiveDateTime) -> Self {
        let alarms = store.load(now);
        let scheduler = Self {
            alarms,
            store,
            events,
            ringing: BTreeMap::new(),
            last_fired: HashMap::new(),
        };
        scheduler.emit_changed();
        scheduler
    }

    /// returns false and changes nothing if an alarm already rings at that minute
    pub fn add_alarm(&mut self, alarm: Alarm) -> bool {
        if self.alarms.iter().any(|existing| existing.is_duplicate_of(&alarm)) {
            log::warn!("alarm at {} already exists", alarm.time.format("%H:%M"));
            return false;
        }
        log::info!("added alarm: {alarm}");
        self.alarms.push(alarm);
        self.persist();
        true
    }

    pub fn remove_alarm(&mut self, id: &str) -> bool {
        let Some(index) = self.alarms.iter().position(|alarm| alarm.id == id) else {
            log::warn!("alarm with id {id} not found");
            return false;
        };
        let removed = self.alarms.remove(index);
        // drops any pending auto-dismiss with it
        self.ringing.remove(id);
        self.last_fired.remove(id);
        log::info!("removed alarm: {removed}");
        self.persist();
        true
    }

    /// disabling a ringing alarm also silences it
    pub fn toggle_alarm(&mut self, id: &str) -> bool {
        let Some(alarm) = self.alarms.iter_mut().find(|alarm| alarm.id == id) else {
            log::warn!("alarm with id {id} not found");
            return false;
        };
        alarm.enabled = !alarm.enabled;
        log::info!("toggled alarm {} to {}", alarm.id, alarm.enabled);
        if !alarm.enabled {
            self.dismiss_alarm(id);
        }
        self.persist();
        true
    }

    /// user initiated dismiss. false if the alarm wasn't ringing.
    pub fn dismiss_alarm(&mut self, id: &str) -> bool {
        if self.ringing.remove(id).is_none() {
            return false;
        }
        log::info!("dismissed alarm: {id}");
        self.events.emit(Event::AlarmDismissed(id.to_string()));
        true
    }

    #[must_use]
    pub fn get_alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    #[must_use]
    pub fn get_alarm(&self, id: &str) -> Option<&Alarm> {
        self.alarms.iter().find(|alarm| alarm.id == id)
    }

    #[must_use]
    pub fn is_ringing(&self, id: &str) -> bool {
        self.ringing.contains_key(id)
    }

    pub fn ringing_ids(&self) -> impl Iterator<Item = &str> {
        self.ringing.keys().map(String::as_str)
    }

    /// the due-check. fires every enabled alarm set for `now`'s hour and
    /// minute that isn't already ringing and returns the ones it fired.
    pub fn check_alarms(&mut self, now: NaiveDateTime) -> Vec<Alarm> {
        self.expire_dismissals(now);
        let minute = truncate_to_minute(now);
        self.release_rolled_over(minute);
        self.last_fired.retain(|_, fired| *fired == minute);

        let due: Vec<Alarm> = self
            .alarms
            .iter()
            .filter(|alarm| {
                alarm.enabled
                    && alarm.is_due_at(now.time())
                    && !self.ringing.contains_key(&alarm.id)
                    && !self.last_fired.contains_key(&alarm.id)
            })
            .cloned()
            .collect();
        for alarm in &due {
            self.trigger_alarm(alarm, now);
        }
        due
    }

    /// dismisses every ringing alarm whose auto-dismiss deadline has passed
    pub fn expire_dismissals(&mut self, now: NaiveDateTime) -> Vec<String> {
        let expired: Vec<String> = self
            .ringing
            .iter()
            .filter(|(_, ringing)| ringing.dismiss_at.is_some_and(|at| at <= now))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            self.ringing.remove(id);
            if self.get_alarm(id).is_some() {
                log::info!("auto-dismissed alarm: {id}");
                self.events.emit(Event::AlarmDismissed(id.clone()));
            }
        }
        expired
    }

    /// earliest pending auto-dismiss deadline
    #[must_use]
    pub fn next_dismissal(&self) -> Option<NaiveDateTime> {
        self.ringing.values().filter_map(|ringing| ringing.dismiss_at).min()
    }

    fn trigger_alarm(&mut self, alarm: &Alarm, now: NaiveDateTime) {
        log::info!("triggering alarm: {alarm}");
        self.events.emit(Event::AlarmTriggered(alarm.clone()));
        let dismiss_at = alarm
            .auto_dismiss
            .then(|| now + Duration::seconds(i64::from(alarm.duration)));
        self.ringing.insert(
            alarm.id.clone(),
            Ringing {
                fired_at: now,
                dismiss_at,
            },
        );
        self.last_fired.insert(alarm.id.clone(), truncate_to_minute(now));
    }

    /// alarms without auto-dismiss stop ringing once their minute is over,
    /// which lets them fire again the next day
    fn release_rolled_over(&mut self, minute: NaiveDateTime) {
        let released: Vec<String> = self
            .ringing
            .iter()
            .filter(|(_, ringing)| {
                ringing.dismiss_at.is_none() && truncate_to_minute(ringing.fired_at) != minute
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in released {
            self.ringing.remove(&id);
            log::debug!("released alarm {id} at minute rollover");
            self.events.emit(Event::AlarmDismissed(id));
        }
    }

    fn persist(&self) {
        self.store.save(&self.alarms);
        self.emit_changed();
    }

    fn emit_changed(&self) {
        self.events.emit(Event::AlarmsChanged(self.alarms.clone()));
    }
}
