// file: src/views.rs
// description: view controllers wiring the fetch layer, live channel, and
// reconciler: seed on mount, merge pushes, tear down on unmount

use crate::{
    api::ApiClient,
    channel::{LiveChannel, SubscriptionToken},
    error::EventlyError,
    store::SharedStore,
    types::{
        AnalyticsOverview, Event, EventStatus, NewRegistration, Notification, PaymentRequest,
        Registration, RegistrationStatus, SalesPoint, StatusUpdate, TicketClass, topics,
    },
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::warn;

/// Decodes a push body, logging and dropping payloads that do not match the
/// expected shape instead of propagating them.
fn decode<T: DeserializeOwned>(topic: &str, body: serde_json::Value) -> Option<T> {
    match serde_json::from_value(body) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("undecodable payload on {}: {}", topic, e);
            None
        }
    }
}

async fn teardown(channel: &LiveChannel, store: &SharedStore, tokens: &mut Vec<SubscriptionToken>) {
    for token in tokens.drain(..) {
        channel.unsubscribe(&token).await;
    }
    store.lock().await.clear();
}

/// Attendee-facing catalogue of published events. Pushes on the published
/// topic upsert PUBLISHED records and drop everything else from the cache.
pub struct BrowseEventsView {
    api: Arc<ApiClient>,
    channel: Arc<LiveChannel>,
    store: SharedStore,
    tokens: Vec<SubscriptionToken>,
    error: Option<String>,
}

impl BrowseEventsView {
    pub async fn mount(
        api: Arc<ApiClient>,
        channel: Arc<LiveChannel>,
        store: SharedStore,
    ) -> Result<Self, EventlyError> {
        let snapshot = api.list_events().await?;
        {
            let mut cache = store.lock().await;
            cache.seed_events(
                snapshot.into_iter().filter(|e| e.status == EventStatus::Published).collect(),
            );
        }

        let handler_store = store.clone();
        let token = channel
            .subscribe(topics::EVENTS_PUBLISHED, move |body| {
                let store = handler_store.clone();
                async move {
                    let Some(changed) = decode::<Vec<Event>>(topics::EVENTS_PUBLISHED, body) else {
                        return;
                    };
                    let mut cache = store.lock().await;
                    for event in changed {
                        cache.apply_published_event(event);
                    }
                }
            })
            .await;

        Ok(Self { api, channel, store, tokens: vec![token], error: None })
    }

    /// Registers the attendee for an event; the returned record is cached on
    /// success so the ticket shows up before any corroborating push.
    pub async fn register(
        &mut self,
        event_id: i64,
        attendee_id: i64,
        ticket_type: TicketClass,
    ) -> Result<Registration, EventlyError> {
        let request = NewRegistration { event_id, attendee_id, ticket_type };
        match self.api.create_registration(&request).await {
            Ok(registration) => {
                self.store.lock().await.apply_registration(registration.clone());
                self.error = None;
                Ok(registration)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn unmount(&mut self) {
        teardown(&self.channel, &self.store, &mut self.tokens).await;
    }
}

/// Organizer dashboard over the organizer's own events. Status flips toward
/// IN_PROGRESS and COMPLETED arrive exclusively by push or refetch; the only
/// client-initiated transition is cancellation, which requires password
/// re-confirmation and is reflected locally only after the server
/// acknowledges it.
pub struct OrganizerEventsView {
    api: Arc<ApiClient>,
    channel: Arc<LiveChannel>,
    store: SharedStore,
    organizer_id: i64,
    tokens: Vec<SubscriptionToken>,
    pending_cancel: Option<i64>,
    error: Option<String>,
}

impl OrganizerEventsView {
    pub async fn mount(
        api: Arc<ApiClient>,
        channel: Arc<LiveChannel>,
        store: SharedStore,
        organizer_id: i64,
    ) -> Result<Self, EventlyError> {
        let snapshot = api.events_by_organizer(organizer_id).await?;
        store.lock().await.seed_events(snapshot);

        let mut tokens = Vec::new();
        for topic in [topics::EVENTS_IN_PROGRESS, topics::EVENTS_COMPLETED] {
            let handler_store = store.clone();
            let token = channel
                .subscribe(topic, move |body| {
                    let store = handler_store.clone();
                    async move {
                        let Some(updates) = decode::<Vec<StatusUpdate>>(topic, body) else {
                            return;
                        };
                        let mut cache = store.lock().await;
                        for update in updates {
                            cache.apply_status_update(update);
                        }
                    }
                })
                .await;
            tokens.push(token);
        }

        Ok(Self {
            api,
            channel,
            store,
            organizer_id,
            tokens,
            pending_cancel: None,
            error: None,
        })
    }

    pub async fn create_event(&mut self, draft: &Event) -> Result<Event, EventlyError> {
        match self.api.create_event(draft).await {
            Ok(created) => {
                self.store.lock().await.apply_event(created.clone());
                self.error = None;
                Ok(created)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn update_event(&mut self, id: i64, draft: &Event) -> Result<Event, EventlyError> {
        match self.api.update_event(id, draft).await {
            Ok(updated) => {
                self.store.lock().await.apply_event(updated.clone());
                self.error = None;
                Ok(updated)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Requests cancellation. While the request is outstanding the view shows
    /// a pending state; the status flips to CANCELLED only on the server's
    /// acknowledgment, never optimistically.
    pub async fn cancel_event(&mut self, id: i64, password: &str) -> Result<(), EventlyError> {
        self.pending_cancel = Some(id);
        let result = self.api.cancel_event(id, password).await;
        self.pending_cancel = None;

        match result {
            Ok(cancelled) => {
                self.store.lock().await.apply_event(cancelled);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn organizer_id(&self) -> i64 {
        self.organizer_id
    }

    pub fn pending_cancel(&self) -> Option<i64> {
        self.pending_cancel
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn unmount(&mut self) {
        teardown(&self.channel, &self.store, &mut self.tokens).await;
    }
}

/// Attendee's own registrations, including payment and refund requests.
pub struct RegistrationsView {
    api: Arc<ApiClient>,
    store: SharedStore,
    attendee_id: i64,
    error: Option<String>,
}

impl RegistrationsView {
    pub async fn mount(
        api: Arc<ApiClient>,
        store: SharedStore,
        attendee_id: i64,
    ) -> Result<Self, EventlyError> {
        let snapshot = api.user_registrations(attendee_id).await?;
        store.lock().await.seed_registrations(snapshot);
        Ok(Self { api, store, attendee_id, error: None })
    }

    pub async fn pay(&mut self, registration_id: i64, card_last_four: &str) -> Result<(), EventlyError> {
        let api = self.api.clone();
        let request = PaymentRequest {
            registration_id,
            card_last_four: card_last_four.to_string(),
        };
        transition(
            &mut self.error,
            &self.store,
            registration_id,
            RegistrationStatus::Paid,
            async move { api.make_payment(&request).await },
        )
        .await
    }

    pub async fn request_refund(&mut self, registration_id: i64) -> Result<(), EventlyError> {
        let api = self.api.clone();
        transition(
            &mut self.error,
            &self.store,
            registration_id,
            RegistrationStatus::RefundRequested,
            async move { api.request_refund(registration_id).await },
        )
        .await
    }

    pub fn attendee_id(&self) -> i64 {
        self.attendee_id
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn unmount(&mut self) {
        self.store.lock().await.clear();
    }
}

/// Organizer's per-event attendee list with the registration lifecycle
/// actions: approve/reject a pending registration, settle a refund request.
pub struct AttendeeListView {
    api: Arc<ApiClient>,
    store: SharedStore,
    event_id: i64,
    error: Option<String>,
}

impl AttendeeListView {
    pub async fn mount(
        api: Arc<ApiClient>,
        store: SharedStore,
        event_id: i64,
    ) -> Result<Self, EventlyError> {
        let snapshot = api.event_registrations(event_id).await?;
        store.lock().await.seed_registrations(snapshot);
        Ok(Self { api, store, event_id, error: None })
    }

    pub async fn approve(&mut self, registration_id: i64) -> Result<(), EventlyError> {
        let api = self.api.clone();
        transition(
            &mut self.error,
            &self.store,
            registration_id,
            RegistrationStatus::Approved,
            async move { api.approve_registration(registration_id).await },
        )
        .await
    }

    pub async fn reject(&mut self, registration_id: i64) -> Result<(), EventlyError> {
        let api = self.api.clone();
        transition(
            &mut self.error,
            &self.store,
            registration_id,
            RegistrationStatus::Rejected,
            async move { api.reject_registration(registration_id).await },
        )
        .await
    }

    pub async fn approve_refund(&mut self, registration_id: i64) -> Result<(), EventlyError> {
        let api = self.api.clone();
        transition(
            &mut self.error,
            &self.store,
            registration_id,
            RegistrationStatus::Refunded,
            async move { api.approve_refund(registration_id).await },
        )
        .await
    }

    /// Refunds a paid registration directly, without a preceding attendee
    /// request.
    pub async fn refund(&mut self, registration_id: i64) -> Result<(), EventlyError> {
        let api = self.api.clone();
        transition(
            &mut self.error,
            &self.store,
            registration_id,
            RegistrationStatus::Refunded,
            async move { api.refund_registration(registration_id).await },
        )
        .await
    }

    /// A rejected refund returns the registration to PAID.
    pub async fn reject_refund(&mut self, registration_id: i64) -> Result<(), EventlyError> {
        let api = self.api.clone();
        transition(
            &mut self.error,
            &self.store,
            registration_id,
            RegistrationStatus::Paid,
            async move { api.reject_refund(registration_id).await },
        )
        .await
    }

    pub fn event_id(&self) -> i64 {
        self.event_id
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn unmount(&mut self) {
        self.store.lock().await.clear();
    }
}

/// Optimistically applies a registration transition, then settles it against
/// the request outcome: the server's record wins on success, the prior
/// status is restored on failure and the error stays with this view.
async fn transition(
    error: &mut Option<String>,
    store: &SharedStore,
    registration_id: i64,
    target: RegistrationStatus,
    request: impl Future<Output = Result<Registration, EventlyError>>,
) -> Result<(), EventlyError> {
    let prior = store.lock().await.set_registration_status(registration_id, target);

    match request.await {
        Ok(confirmed) => {
            store.lock().await.apply_registration(confirmed);
            *error = None;
            Ok(())
        }
        Err(e) => {
            if let Some(prior) = prior {
                store.lock().await.set_registration_status(registration_id, prior);
            }
            *error = Some(e.to_string());
            Err(e)
        }
    }
}

/// Organizer analytics: aggregate overview plus the per-date sales series,
/// switchable between the organizer-wide scope and a single focused event.
pub struct AnalyticsView {
    api: Arc<ApiClient>,
    channel: Arc<LiveChannel>,
    store: SharedStore,
    organizer_id: i64,
    focused_event: Option<i64>,
    tokens: Vec<SubscriptionToken>,
    error: Option<String>,
}

impl AnalyticsView {
    pub async fn mount(
        api: Arc<ApiClient>,
        channel: Arc<LiveChannel>,
        store: SharedStore,
        organizer_id: i64,
    ) -> Result<Self, EventlyError> {
        let mut view = Self {
            api,
            channel,
            store,
            organizer_id,
            focused_event: None,
            tokens: Vec::new(),
            error: None,
        };
        view.enter_organizer_scope().await?;
        Ok(view)
    }

    /// Narrows the view to one event: full refetch of that event's overview
    /// and sales, and a topic switch. The old topics are unsubscribed before
    /// the new ones are subscribed so a record is never delivered twice.
    pub async fn focus_event(&mut self, event_id: i64) -> Result<(), EventlyError> {
        let overview = match self.api.event_overview(event_id).await {
            Ok(overview) => overview,
            Err(e) => return Err(self.record_error(e)),
        };
        let sales = match self.api.event_sales(event_id).await {
            Ok(sales) => sales,
            Err(e) => return Err(self.record_error(e)),
        };
        {
            let mut cache = self.store.lock().await;
            cache.set_overview(overview);
            cache.seed_sales(sales);
        }

        self.drop_subscriptions().await;
        self.subscribe_scope(topics::event_sales(event_id), topics::event_analytics(event_id))
            .await;
        self.focused_event = Some(event_id);
        self.error = None;
        Ok(())
    }

    /// Returns to the organizer-wide scope.
    pub async fn clear_focus(&mut self) -> Result<(), EventlyError> {
        self.drop_subscriptions().await;
        self.focused_event = None;
        self.enter_organizer_scope().await
    }

    async fn enter_organizer_scope(&mut self) -> Result<(), EventlyError> {
        let overview = match self.api.organizer_overview(self.organizer_id).await {
            Ok(overview) => overview,
            Err(e) => return Err(self.record_error(e)),
        };
        {
            let mut cache = self.store.lock().await;
            cache.set_overview(overview);
            cache.seed_sales(Vec::new());
        }
        self.subscribe_scope(
            topics::sales(self.organizer_id),
            topics::analytics(self.organizer_id),
        )
        .await;
        self.error = None;
        Ok(())
    }

    fn record_error(&mut self, e: EventlyError) -> EventlyError {
        self.error = Some(e.to_string());
        e
    }

    async fn subscribe_scope(&mut self, sales_topic: String, analytics_topic: String) {
        let handler_store = self.store.clone();
        let topic = sales_topic.clone();
        let sales_token = self
            .channel
            .subscribe(&sales_topic, move |body| {
                let store = handler_store.clone();
                let topic = topic.clone();
                async move {
                    if let Some(point) = decode::<SalesPoint>(&topic, body) {
                        store.lock().await.apply_sale(point);
                    }
                }
            })
            .await;

        let handler_store = self.store.clone();
        let topic = analytics_topic.clone();
        let overview_token = self
            .channel
            .subscribe(&analytics_topic, move |body| {
                let store = handler_store.clone();
                let topic = topic.clone();
                async move {
                    if let Some(overview) = decode::<AnalyticsOverview>(&topic, body) {
                        store.lock().await.set_overview(overview);
                    }
                }
            })
            .await;

        self.tokens.push(sales_token);
        self.tokens.push(overview_token);
    }

    async fn drop_subscriptions(&mut self) {
        for token in self.tokens.drain(..) {
            self.channel.unsubscribe(&token).await;
        }
    }

    pub fn focused_event(&self) -> Option<i64> {
        self.focused_event
    }

    pub fn subscribed_topics(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.topic()).collect()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn unmount(&mut self) {
        teardown(&self.channel, &self.store, &mut self.tokens).await;
    }
}

/// Per-user notification feed. New notifications prepend on arrival; the
/// read flag flips only after the server acknowledges the mark-read call.
pub struct NotificationsView {
    api: Arc<ApiClient>,
    channel: Arc<LiveChannel>,
    store: SharedStore,
    tokens: Vec<SubscriptionToken>,
    error: Option<String>,
}

impl NotificationsView {
    pub async fn mount(
        api: Arc<ApiClient>,
        channel: Arc<LiveChannel>,
        store: SharedStore,
        user_id: i64,
    ) -> Result<Self, EventlyError> {
        let snapshot = api.user_notifications(user_id).await?;
        store.lock().await.seed_notifications(snapshot);

        let topic = topics::notifications(user_id);
        let handler_store = store.clone();
        let handler_topic = topic.clone();
        let token = channel
            .subscribe(&topic, move |body| {
                let store = handler_store.clone();
                let topic = handler_topic.clone();
                async move {
                    if let Some(notification) = decode::<Notification>(&topic, body) {
                        store.lock().await.push_notification(notification);
                    }
                }
            })
            .await;

        Ok(Self { api, channel, store, tokens: vec![token], error: None })
    }

    pub async fn mark_read(&mut self, notification_id: i64) -> Result<(), EventlyError> {
        match self.api.mark_notification_read(notification_id).await {
            Ok(_) => {
                self.store.lock().await.mark_notification_read(notification_id);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn unread_count(&self) -> usize {
        self.store.lock().await.unread_count()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn unmount(&mut self) {
        teardown(&self.channel, &self.store, &mut self.tokens).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::create_event_channel;
    use crate::store::SyncStore;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves canned JSON responses matched by path substring until dropped.
    /// The first matching route wins; unmatched requests get 404.
    async fn spawn_api_server(routes: Vec<(&'static str, &'static str, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = request.lines().next().unwrap_or_default().to_string();

                    let (status, body) = routes
                        .iter()
                        .find(|(fragment, _, _)| path.contains(fragment))
                        .map(|(_, status, body)| (*status, *body))
                        .unwrap_or(("404 Not Found", "{}"));

                    let response = format!(
                        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
        format!("http://{addr}")
    }

    fn api(base: &str) -> Arc<ApiClient> {
        Arc::new(ApiClient::new(base, Duration::from_secs(2)).unwrap())
    }

    fn offline_channel() -> Arc<LiveChannel> {
        let (events, mut rx) = create_event_channel();
        tokio::spawn(async move { while rx.recv().await.is_some() {} });
        // Nothing listens on this port; the worker keeps retrying quietly.
        let url = url::Url::parse("ws://127.0.0.1:9").unwrap();
        Arc::new(LiveChannel::open(url, Duration::from_millis(200), events))
    }

    #[tokio::test]
    async fn failed_approval_rolls_back_and_records_inline_error() {
        let base = spawn_api_server(vec![
            ("/registrations/event/", "200 OK", r#"[{"id":7,"status":"PENDING"}]"#),
            ("/approve", "500 Internal Server Error", r#"{"message":"boom"}"#),
        ])
        .await;

        let store = SyncStore::shared();
        let mut view = AttendeeListView::mount(api(&base), store.clone(), 1).await.unwrap();

        let err = view.approve(7).await.unwrap_err();
        assert!(matches!(err, EventlyError::Server { status: 500, .. }));
        assert_eq!(store.lock().await.registration(7).unwrap().status, RegistrationStatus::Pending);
        assert_eq!(view.last_error(), Some("server error (500): boom"));
    }

    #[tokio::test]
    async fn successful_approval_keeps_server_confirmed_record() {
        let base = spawn_api_server(vec![
            ("/registrations/event/", "200 OK", r#"[{"id":7,"status":"PENDING"}]"#),
            ("/approve", "200 OK", r#"{"id":7,"status":"APPROVED"}"#),
        ])
        .await;

        let store = SyncStore::shared();
        let mut view = AttendeeListView::mount(api(&base), store.clone(), 1).await.unwrap();

        view.approve(7).await.unwrap();
        assert_eq!(store.lock().await.registration(7).unwrap().status, RegistrationStatus::Approved);
        assert!(view.last_error().is_none());
    }

    #[tokio::test]
    async fn refund_rejection_returns_registration_to_paid() {
        let base = spawn_api_server(vec![
            ("/registrations/event/", "200 OK", r#"[{"id":3,"status":"REFUND_REQUESTED"}]"#),
            ("/reject-refund", "200 OK", r#"{"id":3,"status":"PAID"}"#),
        ])
        .await;

        let store = SyncStore::shared();
        let mut view = AttendeeListView::mount(api(&base), store.clone(), 1).await.unwrap();

        view.reject_refund(3).await.unwrap();
        assert_eq!(store.lock().await.registration(3).unwrap().status, RegistrationStatus::Paid);
    }

    #[tokio::test]
    async fn direct_refund_moves_paid_registration_to_refunded() {
        let base = spawn_api_server(vec![
            ("/registrations/event/", "200 OK", r#"[{"id":4,"status":"PAID"}]"#),
            ("/payments/4/refund", "200 OK", r#"{"id":4,"status":"REFUNDED"}"#),
        ])
        .await;

        let store = SyncStore::shared();
        let mut view = AttendeeListView::mount(api(&base), store.clone(), 1).await.unwrap();

        view.refund(4).await.unwrap();
        assert_eq!(store.lock().await.registration(4).unwrap().status, RegistrationStatus::Refunded);
        assert!(view.last_error().is_none());
    }

    #[tokio::test]
    async fn cancel_is_not_optimistic_and_fails_closed() {
        let base = spawn_api_server(vec![
            ("/organizer/", "200 OK", r#"[{"id":5,"status":"PUBLISHED"}]"#),
            ("/cancel", "403 Forbidden", r#"{"message":"wrong password"}"#),
        ])
        .await;

        let store = SyncStore::shared();
        let mut view =
            OrganizerEventsView::mount(api(&base), offline_channel(), store.clone(), 1)
                .await
                .unwrap();

        let err = view.cancel_event(5, "bad").await.unwrap_err();
        assert!(matches!(err, EventlyError::Server { status: 403, .. }));
        // No optimistic flip: status is untouched and the pending state cleared.
        assert_eq!(store.lock().await.event(5).unwrap().status, EventStatus::Published);
        assert_eq!(view.pending_cancel(), None);
        assert_eq!(view.last_error(), Some("server error (403): wrong password"));

        view.unmount().await;
    }

    #[tokio::test]
    async fn cancel_applies_only_the_acknowledged_record() {
        let base = spawn_api_server(vec![
            ("/organizer/", "200 OK", r#"[{"id":5,"status":"PUBLISHED"}]"#),
            ("/cancel", "200 OK", r#"{"id":5,"status":"CANCELLED"}"#),
        ])
        .await;

        let store = SyncStore::shared();
        let mut view =
            OrganizerEventsView::mount(api(&base), offline_channel(), store.clone(), 1)
                .await
                .unwrap();

        view.cancel_event(5, "hunter2").await.unwrap();
        assert_eq!(store.lock().await.event(5).unwrap().status, EventStatus::Cancelled);

        view.unmount().await;
    }

    #[tokio::test]
    async fn analytics_focus_switch_replaces_topic_set() {
        let base = spawn_api_server(vec![
            ("/analytics/overview/", "200 OK", r#"{"totalRevenue":10.0}"#),
            ("/analytics/events/33/overview", "200 OK", r#"{"totalRevenue":4.0}"#),
            ("/analytics/events/33/sales", "200 OK", r#"[{"date":"2024-01-01","general":2,"vip":0}]"#),
        ])
        .await;

        let store = SyncStore::shared();
        let channel = offline_channel();
        let mut view = AnalyticsView::mount(api(&base), channel, store.clone(), 9).await.unwrap();

        assert_eq!(
            view.subscribed_topics(),
            vec![topics::sales(9).as_str(), topics::analytics(9).as_str()]
        );

        view.focus_event(33).await.unwrap();
        assert_eq!(view.focused_event(), Some(33));
        // Old organizer-wide topics are gone; only the event-scoped pair remains.
        assert_eq!(
            view.subscribed_topics(),
            vec![topics::event_sales(33).as_str(), topics::event_analytics(33).as_str()]
        );
        assert_eq!(store.lock().await.overview().unwrap().total_revenue, 4.0);
        assert_eq!(store.lock().await.sales().len(), 1);

        view.unmount().await;
    }

    #[tokio::test]
    async fn failed_focus_switch_records_inline_error_and_keeps_scope() {
        let base = spawn_api_server(vec![
            ("/analytics/overview/", "200 OK", r#"{"totalRevenue":10.0}"#),
            ("/analytics/events/33/overview", "500 Internal Server Error", r#"{"message":"oops"}"#),
        ])
        .await;

        let store = SyncStore::shared();
        let mut view =
            AnalyticsView::mount(api(&base), offline_channel(), store.clone(), 9).await.unwrap();

        let err = view.focus_event(33).await.unwrap_err();
        assert!(matches!(err, EventlyError::Server { status: 500, .. }));
        assert_eq!(view.last_error(), Some("server error (500): oops"));
        // The failed switch leaves the organizer-wide scope untouched.
        assert_eq!(view.focused_event(), None);
        assert_eq!(
            view.subscribed_topics(),
            vec![topics::sales(9).as_str(), topics::analytics(9).as_str()]
        );
        assert_eq!(store.lock().await.overview().unwrap().total_revenue, 10.0);

        view.unmount().await;
    }

    #[tokio::test]
    async fn mark_read_waits_for_server_acknowledgment() {
        let base = spawn_api_server(vec![
            ("/notifications/users/", "200 OK", r#"[{"id":1,"title":"hi","read":false}]"#),
            ("/notifications/1/read", "500 Internal Server Error", r#"{"message":"down"}"#),
        ])
        .await;

        let store = SyncStore::shared();
        let mut view =
            NotificationsView::mount(api(&base), offline_channel(), store.clone(), 2).await.unwrap();

        assert_eq!(view.unread_count().await, 1);
        let err = view.mark_read(1).await.unwrap_err();
        assert!(matches!(err, EventlyError::Server { .. }));
        // No acknowledgment, no local flip.
        assert_eq!(view.unread_count().await, 1);

        view.unmount().await;
    }

    #[tokio::test]
    async fn unmount_clears_the_cache() {
        let base = spawn_api_server(vec![(
            "/events",
            "200 OK",
            r#"[{"id":1,"status":"PUBLISHED"},{"id":2,"status":"CANCELLED"}]"#,
        )])
        .await;

        let store = SyncStore::shared();
        let mut view =
            BrowseEventsView::mount(api(&base), offline_channel(), store.clone()).await.unwrap();

        // Non-published snapshot entries were filtered at seed time.
        assert_eq!(store.lock().await.event_count(), 1);

        view.unmount().await;
        assert_eq!(store.lock().await.event_count(), 0);
    }
}
