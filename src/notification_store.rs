use chrono::NaiveDateTime;

use crate::{
    communication::{Event, EventSender},
    notification::{Category, Notification, NotificationData, ScheduledNotification},
};

/// Delivered notifications plus the queue of ones waiting for their time.
///
/// Nothing here is persisted. Every change to the delivered list is followed
/// by `NotificationsUpdated` carrying a copy of the whole list.
#[derive(Debug)]
pub struct NotificationStore {
    notifications: Vec<Notification>,
    pending: Vec<ScheduledNotification>,
    events: EventSender,
    next_id: u64,
}

impl NotificationStore {
    #[must_use]
    pub const fn new(events: EventSender) -> Self {
        Self {
            notifications: Vec::new(),
            pending: Vec::new(),
            events,
            next_id: 0,
        }
    }

    /// `<timestamp>-<counter>`, unique for the life of the store
    pub(crate) fn make_id(&mut self, at: NaiveDateTime) -> String {
        self.next_id += 1;
        format!("{}-{}", at.format("%Y%m%d%H%M%S"), self.next_id)
    }

    pub fn add_notification(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        category: Category,
        data: NotificationData,
        now: NaiveDateTime,
    ) -> Notification {
        let notification = Notification {
            id: self.make_id(now),
            title: title.into(),
            message: message.into(),
            category,
            timestamp: now,
            read: false,
            data,
        };
        self.notifications.push(notification.clone());
        log::info!("notification added: {notification}");
        self.events
            .emit(Event::NotificationAdded(notification.clone()));
        self.emit_updated();
        notification
    }

    pub fn remove_notification(&mut self, id: &str) -> bool {
        let Some(index) = self.notifications.iter().position(|n| n.id == id) else {
            return false;
        };
        let removed = self.notifications.remove(index);
        log::info!("notification removed: {removed}");
        self.events.emit(Event::NotificationRemoved(id.to_string()));
        self.emit_updated();
        true
    }

    /// everything, or just one category
    pub fn clear_notifications(&mut self, category: Option<Category>) {
        match category {
            Some(category) => {
                self.notifications.retain(|n| n.category != category);
                log::info!("notifications cleared for category {category}");
            }
            None => {
                self.notifications.clear();
                log::info!("notifications cleared");
            }
        }
        self.emit_updated();
    }

    #[must_use]
    pub fn get_notifications(
        &self,
        category: Option<Category>,
        unread_only: bool,
    ) -> Vec<Notification> {
        self.notifications
            .iter()
            .filter(|n| category.map_or(true, |category| n.category == category))
            .filter(|n| !unread_only || !n.read)
            .cloned()
            .collect()
    }

    pub fn mark_all_as_read(&mut self, category: Option<Category>) {
        self.notifications
            .iter_mut()
            .filter(|n| category.map_or(true, |category| n.category == category))
            .for_each(Notification::mark_as_read);
        match category {
            Some(category) => log::info!("notifications marked as read for category {category}"),
            None => log::info!("notifications marked as read"),
        }
        self.emit_updated();
    }

    pub fn mark_as_read(&mut self, id: &str) -> bool {
        let Some(notification) = self.notifications.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        notification.mark_as_read();
        self.emit_updated();
        true
    }

    #[must_use]
    pub fn unread_count(&self, category: Option<Category>) -> usize {
        self.notifications
            .iter()
            .filter(|n| !n.read && category.map_or(true, |category| n.category == category))
            .count()
    }

    pub fn push_pending(&mut self, scheduled: ScheduledNotification) {
        self.pending.push(scheduled);
    }

    pub fn cancel_pending(&mut self, id: &str) -> Option<ScheduledNotification> {
        let index = self.pending.iter().position(|s| s.id == id)?;
        Some(self.pending.remove(index))
    }

    #[must_use]
    pub fn pending(&self) -> &[ScheduledNotification] {
        &self.pending
    }

    /// removes and returns every pending entry due at `now`, in queue order
    pub fn take_due(&mut self, now: NaiveDateTime) -> Vec<ScheduledNotification> {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|scheduled| scheduled.is_due(now));
        self.pending = waiting;
        due
    }

    fn emit_updated(&self) {
        self.events
            .emit(Event::NotificationsUpdated(self.notifications.clone()));
    }
}
