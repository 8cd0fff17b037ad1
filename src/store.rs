/// file: src/store.rs
/// description: reconciler owning the local entity cache shared between views and the live channel
use crate::types::{
    AnalyticsOverview, Event, EventStatus, Notification, Registration, RegistrationStatus,
    SalesPoint, StatusUpdate,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The authoritative local cache. One entry per key, last-writer-wins on
/// replace; snapshots seed a resource wholesale, push updates upsert single
/// records. All reads go through accessors on this type so the rendering
/// layer never mutates cached data directly.
///
/// Snapshot application and push application race by design: a snapshot that
/// resolves after a push for the same key wins and may stomp the newer
/// push-derived value. Simplicity over strict recency.
#[derive(Debug, Default)]
pub struct SyncStore {
    events: HashMap<i64, Event>,
    registrations: HashMap<i64, Registration>,
    sales: Vec<SalesPoint>,
    overview: Option<AnalyticsOverview>,
    notifications: Vec<Notification>,
}

impl SyncStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Mutex::new(Self::new()))
    }

    // --- events ---

    /// Replaces the whole event cache with a freshly fetched snapshot.
    pub fn seed_events(&mut self, events: Vec<Event>) {
        self.events = events.into_iter().map(|e| (e.id, e)).collect();
    }

    /// Upserts a full event record, keyed by id.
    pub fn apply_event(&mut self, event: Event) {
        self.events.insert(event.id, event);
    }

    /// Applies a record from the published-events topic: PUBLISHED entries
    /// are upserted, anything else leaves the browse cache.
    pub fn apply_published_event(&mut self, event: Event) {
        if event.status == EventStatus::Published {
            self.events.insert(event.id, event);
        } else {
            self.events.remove(&event.id);
        }
    }

    /// Applies a `{id, status}` partial update. An unseen id is cached as a
    /// stub rather than dropped; no re-fetch is issued for it.
    pub fn apply_status_update(&mut self, update: StatusUpdate) {
        self.events
            .entry(update.id)
            .and_modify(|e| e.status = update.status)
            .or_insert_with(|| Event::stub(update.id, update.status));
    }

    /// Sets one event's status, returning the prior value so callers can
    /// roll back if the triggering request ultimately fails.
    pub fn set_event_status(&mut self, id: i64, status: EventStatus) -> Option<EventStatus> {
        let event = self.events.get_mut(&id)?;
        let previous = event.status;
        event.status = status;
        Some(previous)
    }

    pub fn event(&self, id: i64) -> Option<&Event> {
        self.events.get(&id)
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.values().cloned().collect()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    // --- registrations ---

    pub fn seed_registrations(&mut self, registrations: Vec<Registration>) {
        self.registrations = registrations.into_iter().map(|r| (r.id, r)).collect();
    }

    pub fn apply_registration(&mut self, registration: Registration) {
        self.registrations.insert(registration.id, registration);
    }

    /// Sets one registration's status, returning the prior value for
    /// optimistic-update rollback.
    pub fn set_registration_status(
        &mut self,
        id: i64,
        status: RegistrationStatus,
    ) -> Option<RegistrationStatus> {
        let registration = self.registrations.get_mut(&id)?;
        let previous = registration.status;
        registration.status = status;
        Some(previous)
    }

    pub fn registration(&self, id: i64) -> Option<&Registration> {
        self.registrations.get(&id)
    }

    pub fn registrations(&self) -> Vec<Registration> {
        self.registrations.values().cloned().collect()
    }

    // --- sales series ---

    pub fn seed_sales(&mut self, sales: Vec<SalesPoint>) {
        self.sales = sales;
    }

    /// Merges one sales point into the series: an existing entry with the
    /// same date is replaced in place, otherwise the point is appended. The
    /// series is never re-sorted here; charting keeps fetch order.
    pub fn apply_sale(&mut self, point: SalesPoint) {
        match self.sales.iter_mut().find(|p| p.date == point.date) {
            Some(existing) => *existing = point,
            None => self.sales.push(point),
        }
    }

    pub fn sales(&self) -> &[SalesPoint] {
        &self.sales
    }

    // --- analytics overview ---

    /// Overview payloads are emitted complete by the server, so the cached
    /// value is replaced wholesale, never merged field by field.
    pub fn set_overview(&mut self, overview: AnalyticsOverview) {
        self.overview = Some(overview);
    }

    pub fn overview(&self) -> Option<&AnalyticsOverview> {
        self.overview.as_ref()
    }

    // --- notifications ---

    /// Seeds the notification list newest-first.
    pub fn seed_notifications(&mut self, mut notifications: Vec<Notification>) {
        notifications.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        self.notifications = notifications;
    }

    /// Prepends a freshly pushed notification; a repeated id replaces the
    /// existing entry in place instead of duplicating it.
    pub fn push_notification(&mut self, notification: Notification) {
        match self.notifications.iter_mut().find(|n| n.id == notification.id) {
            Some(existing) => *existing = notification,
            None => self.notifications.insert(0, notification),
        }
    }

    /// Flips the read flag; only called after the server acknowledged the
    /// mark-as-read request, never optimistically.
    pub fn mark_notification_read(&mut self, id: i64) {
        if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
            n.read = true;
        }
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Drops every cached entity. Called when the owning view unmounts;
    /// nothing persists across navigation.
    pub fn clear(&mut self) {
        self.events.clear();
        self.registrations.clear();
        self.sales.clear();
        self.overview = None;
        self.notifications.clear();
    }
}

pub type SharedStore = Arc<Mutex<SyncStore>>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(id: i64, title: &str, status: EventStatus) -> Event {
        Event { id, title: title.to_string(), status, ..Event::default() }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn distinct_keys_yield_one_entry_each() {
        let mut store = SyncStore::new();
        for id in 0..20 {
            store.apply_event(event(id, "e", EventStatus::Published));
        }
        assert_eq!(store.event_count(), 20);
    }

    #[test]
    fn repeated_key_keeps_most_recent_record() {
        let mut store = SyncStore::new();
        store.apply_event(event(1, "first", EventStatus::Published));
        store.apply_event(event(1, "second", EventStatus::InProgress));
        assert_eq!(store.event_count(), 1);
        let cached = store.event(1).unwrap();
        assert_eq!(cached.title, "second");
        assert_eq!(cached.status, EventStatus::InProgress);
    }

    #[test]
    fn seed_without_updates_matches_snapshot() {
        let snapshot: Vec<Event> =
            (1..=5).map(|id| event(id, &format!("event {id}"), EventStatus::Published)).collect();
        let mut store = SyncStore::new();
        store.seed_events(snapshot.clone());
        assert_eq!(store.event_count(), snapshot.len());
        for e in &snapshot {
            assert_eq!(store.event(e.id), Some(e));
        }
    }

    #[test]
    fn seed_replaces_prior_cache_wholesale() {
        let mut store = SyncStore::new();
        store.seed_events(vec![event(1, "old", EventStatus::Published)]);
        store.seed_events(vec![event(2, "new", EventStatus::Published)]);
        assert_eq!(store.event_count(), 1);
        assert!(store.event(1).is_none());
    }

    #[test]
    fn sales_update_replaces_matching_date_in_place() {
        let mut store = SyncStore::new();
        store.seed_sales(vec![SalesPoint { date: date("2024-01-01"), general: 5, vip: 1 }]);

        store.apply_sale(SalesPoint { date: date("2024-01-01"), general: 7, vip: 1 });
        assert_eq!(store.sales().len(), 1);
        assert_eq!(store.sales()[0].general, 7);

        store.apply_sale(SalesPoint { date: date("2024-01-02"), general: 2, vip: 0 });
        assert_eq!(store.sales().len(), 2);
        assert!(store.sales().iter().any(|p| p.date == date("2024-01-02") && p.general == 2));
    }

    #[test]
    fn status_update_for_unseen_event_is_cached_as_stub() {
        let mut store = SyncStore::new();
        store.apply_status_update(StatusUpdate { id: 99, status: EventStatus::InProgress });
        let stub = store.event(99).unwrap();
        assert_eq!(stub.status, EventStatus::InProgress);
        assert!(stub.title.is_empty());
    }

    #[test]
    fn published_topic_update_drops_non_published_entries() {
        let mut store = SyncStore::new();
        store.seed_events(vec![event(1, "a", EventStatus::Published)]);
        store.apply_published_event(event(1, "a", EventStatus::Cancelled));
        assert!(store.event(1).is_none());
        store.apply_published_event(event(2, "b", EventStatus::Published));
        assert_eq!(store.event_count(), 1);
    }

    #[test]
    fn status_setter_returns_prior_value_for_rollback() {
        let mut store = SyncStore::new();
        store.apply_registration(Registration {
            id: 7,
            status: RegistrationStatus::Pending,
            ..Registration::default()
        });

        let prior = store.set_registration_status(7, RegistrationStatus::Approved);
        assert_eq!(prior, Some(RegistrationStatus::Pending));

        // Rollback path restores exactly what the setter reported.
        store.set_registration_status(7, prior.unwrap());
        assert_eq!(store.registration(7).unwrap().status, RegistrationStatus::Pending);

        assert_eq!(store.set_registration_status(999, RegistrationStatus::Paid), None);
    }

    #[test]
    fn overview_is_replaced_wholesale() {
        let mut store = SyncStore::new();
        store.set_overview(AnalyticsOverview { total_tickets: 5, ..AnalyticsOverview::default() });
        store.set_overview(AnalyticsOverview { total_revenue: 9.5, ..AnalyticsOverview::default() });
        let overview = store.overview().unwrap();
        assert_eq!(overview.total_revenue, 9.5);
        // Field from the first payload is gone, not merged.
        assert_eq!(overview.total_tickets, 0);
    }

    #[test]
    fn notifications_prepend_and_dedupe_by_id() {
        let mut store = SyncStore::new();
        store.seed_notifications(vec![Notification { id: 1, ..Notification::default() }]);
        store.push_notification(Notification {
            id: 2,
            title: "new".to_string(),
            ..Notification::default()
        });
        assert_eq!(store.notifications()[0].id, 2);

        store.push_notification(Notification {
            id: 2,
            title: "edited".to_string(),
            ..Notification::default()
        });
        assert_eq!(store.notifications().len(), 2);
        assert_eq!(store.notifications()[0].title, "edited");
    }

    #[test]
    fn mark_read_flips_flag_and_unread_count() {
        let mut store = SyncStore::new();
        store.seed_notifications(vec![
            Notification { id: 1, ..Notification::default() },
            Notification { id: 2, ..Notification::default() },
        ]);
        assert_eq!(store.unread_count(), 2);
        store.mark_notification_read(1);
        assert_eq!(store.unread_count(), 1);
        assert!(store.notifications().iter().find(|n| n.id == 1).unwrap().read);
    }

    #[test]
    fn clear_empties_every_resource() {
        let mut store = SyncStore::new();
        store.seed_events(vec![event(1, "a", EventStatus::Published)]);
        store.seed_sales(vec![SalesPoint { date: date("2024-01-01"), general: 1, vip: 0 }]);
        store.set_overview(AnalyticsOverview::default());
        store.clear();
        assert_eq!(store.event_count(), 0);
        assert!(store.sales().is_empty());
        assert!(store.overview().is_none());
    }
}
