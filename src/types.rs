// file: src/types.rs
// description: data models for Evently REST payloads and topic-addressed push frames

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an event as reported by the backend. Transitions are
/// server-authoritative: the client requests only `Cancelled` (with password
/// confirmation) and must never flip a status locally because scheduled time
/// has passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    #[default]
    Published,
    InProgress,
    Completed,
    Cancelled,
}

impl EventStatus {
    /// Whether the event still accepts registrations.
    pub fn is_open(&self) -> bool {
        matches!(self, EventStatus::Published)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Cancelled)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Published => "PUBLISHED",
            EventStatus::InProgress => "IN_PROGRESS",
            EventStatus::Completed => "COMPLETED",
            EventStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Lifecycle of a registration. `Pending -> Approved -> Paid`,
/// `Pending -> Rejected`, `Paid -> RefundRequested -> Refunded`, and
/// `RefundRequested -> Paid` when the organizer rejects the refund.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Approved,
    Paid,
    Rejected,
    RefundRequested,
    Refunded,
}

impl RegistrationStatus {
    pub fn can_request_refund(&self) -> bool {
        matches!(self, RegistrationStatus::Paid)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RegistrationStatus::Rejected | RegistrationStatus::Refunded)
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegistrationStatus::Pending => "PENDING",
            RegistrationStatus::Approved => "APPROVED",
            RegistrationStatus::Paid => "PAID",
            RegistrationStatus::Rejected => "REJECTED",
            RegistrationStatus::RefundRequested => "REFUND_REQUESTED",
            RegistrationStatus::Refunded => "REFUNDED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketClass {
    #[default]
    General,
    Vip,
}

/// An event record. Most fields default because push updates may reference
/// an event the view never fetched; such entries are cached as
/// partially-populated stubs and renderers must tolerate them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub location: String,
    pub event_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub event_type: String,
    pub status: EventStatus,
    pub general_price: f64,
    pub vip_price: f64,
    pub general_ticket_limit: u32,
    pub vip_ticket_limit: u32,
    pub image_url: Option<String>,
    pub organizer_id: i64,
}

impl Event {
    /// Stub for a push update that referenced a never-fetched event.
    pub fn stub(id: i64, status: EventStatus) -> Self {
        Event { id, status, ..Event::default() }
    }
}

/// Partial event update carried on the `/topic/events/inprogress` and
/// `/topic/events/completed` topics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub id: i64,
    pub status: EventStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub attendee_id: i64,
    pub event_title: String,
    pub ticket_type: TicketClass,
    pub status: RegistrationStatus,
    pub amount_due: f64,
    pub card_last_four: Option<String>,
}

/// Request body for `POST /registrations`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistration {
    pub event_id: i64,
    pub attendee_id: i64,
    pub ticket_type: TicketClass,
}

/// Request body for `POST /payments/make`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub registration_id: i64,
    pub card_last_four: String,
}

/// Request body for `PUT /events/{id}/cancel`.
#[derive(Debug, Clone, Serialize)]
pub struct CancelEventRequest {
    pub password: String,
}

/// One point of the per-date ticket sales series. Keyed by `date` inside the
/// series; an incoming point with a known date replaces the old one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPoint {
    pub date: NaiveDate,
    pub general: u32,
    pub vip: u32,
}

/// Aggregate analytics counters. Always emitted complete by the server and
/// replaced wholesale on the client, never merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsOverview {
    pub total_revenue: f64,
    pub total_tickets: u32,
    pub refunded_tickets: u32,
    pub total_events: u32,
    pub upcoming_events: u32,
    pub cancelled_events: u32,
    pub revenue_by_type: Vec<RevenueSlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSlice {
    #[serde(rename = "type")]
    pub ticket_type: TicketClass,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub read: bool,
}

// Wire frames for the topic-addressed WebSocket subprotocol. Bodies are
// UTF-8 JSON; the envelope carries the topic so one connection can multiplex
// every subscription of a view.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub method: String,
    pub topic: String,
}

impl SubscriptionRequest {
    pub fn subscribe(topic: &str) -> Self {
        Self { method: "subscribe".to_string(), topic: topic.to_string() }
    }

    pub fn unsubscribe(topic: &str) -> Self {
        Self { method: "unsubscribe".to_string(), topic: topic.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    pub topic: String,
    pub body: serde_json::Value,
}

/// Builders for the hierarchical topic names consumed by the dashboards.
pub mod topics {
    /// All published-event changes, payload: array of full event records.
    pub const EVENTS_PUBLISHED: &str = "/topic/events/published";
    /// Events entering IN_PROGRESS, payload: array of `{id, status}`.
    pub const EVENTS_IN_PROGRESS: &str = "/topic/events/inprogress";
    /// Events entering COMPLETED, payload: array of `{id, status}`.
    pub const EVENTS_COMPLETED: &str = "/topic/events/completed";

    pub fn sales(organizer_id: i64) -> String {
        format!("/topic/sales/{organizer_id}")
    }

    pub fn event_sales(event_id: i64) -> String {
        format!("/topic/sales/event/{event_id}")
    }

    pub fn analytics(organizer_id: i64) -> String {
        format!("/topic/analytics/{organizer_id}")
    }

    pub fn event_analytics(event_id: i64) -> String {
        format!("/topic/analytics/event/{event_id}")
    }

    pub fn notifications(user_id: i64) -> String {
        format!("/topic/notifications/{user_id}")
    }
}
