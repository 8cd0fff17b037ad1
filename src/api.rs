// file: src/api.rs
// description: REST fetch layer for point-in-time snapshots and explicit user actions

use crate::error::EventlyError;
use crate::types::{
    AnalyticsOverview, CancelEventRequest, Event, NewRegistration, Notification, PaymentRequest,
    Registration, SalesPoint,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

/// Thin typed client over the Evently REST API. Every call is a single
/// request/response snapshot: no automatic retries, no cache writes. Callers
/// hand successful payloads to the reconciler and decide what to do with
/// failures.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, EventlyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(EventlyError::Network)?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    // --- events ---

    pub async fn list_events(&self) -> Result<Vec<Event>, EventlyError> {
        self.get("/events").await
    }

    pub async fn get_event(&self, id: i64) -> Result<Event, EventlyError> {
        self.get(&format!("/events/{id}")).await
    }

    pub async fn create_event(&self, draft: &Event) -> Result<Event, EventlyError> {
        self.post("/events", draft).await
    }

    pub async fn update_event(&self, id: i64, draft: &Event) -> Result<Event, EventlyError> {
        self.put(&format!("/events/{id}"), draft).await
    }

    /// Requests cancellation; honored by the server only after password
    /// re-confirmation, so callers must not flip the status before this
    /// resolves.
    pub async fn cancel_event(&self, id: i64, password: &str) -> Result<Event, EventlyError> {
        let body = CancelEventRequest { password: password.to_string() };
        self.put(&format!("/events/{id}/cancel"), &body).await
    }

    pub async fn events_by_organizer(&self, organizer_id: i64) -> Result<Vec<Event>, EventlyError> {
        self.get(&format!("/events/organizer/{organizer_id}")).await
    }

    // --- registrations ---

    pub async fn create_registration(
        &self,
        registration: &NewRegistration,
    ) -> Result<Registration, EventlyError> {
        self.post("/registrations", registration).await
    }

    pub async fn user_registrations(
        &self,
        attendee_id: i64,
    ) -> Result<Vec<Registration>, EventlyError> {
        self.get(&format!("/registrations/users/{attendee_id}")).await
    }

    pub async fn event_registrations(
        &self,
        event_id: i64,
    ) -> Result<Vec<Registration>, EventlyError> {
        self.get(&format!("/registrations/event/{event_id}")).await
    }

    pub async fn approve_registration(&self, id: i64) -> Result<Registration, EventlyError> {
        self.put_empty(&format!("/registrations/{id}/approve")).await
    }

    pub async fn reject_registration(&self, id: i64) -> Result<Registration, EventlyError> {
        self.put_empty(&format!("/registrations/{id}/reject")).await
    }

    // --- payments ---

    pub async fn make_payment(&self, payment: &PaymentRequest) -> Result<Registration, EventlyError> {
        self.post("/payments/make", payment).await
    }

    /// Organizer-initiated refund of a paid registration, without a
    /// preceding attendee request.
    pub async fn refund_registration(
        &self,
        registration_id: i64,
    ) -> Result<Registration, EventlyError> {
        self.post_empty(&format!("/payments/{registration_id}/refund")).await
    }

    pub async fn request_refund(&self, registration_id: i64) -> Result<Registration, EventlyError> {
        self.post_empty(&format!("/payments/{registration_id}/request-refund")).await
    }

    pub async fn approve_refund(&self, registration_id: i64) -> Result<Registration, EventlyError> {
        self.put_empty(&format!("/payments/{registration_id}/approve-refund")).await
    }

    pub async fn reject_refund(&self, registration_id: i64) -> Result<Registration, EventlyError> {
        self.put_empty(&format!("/payments/{registration_id}/reject-refund")).await
    }

    // --- analytics ---

    pub async fn organizer_overview(
        &self,
        organizer_id: i64,
    ) -> Result<AnalyticsOverview, EventlyError> {
        self.get(&format!("/analytics/overview/{organizer_id}")).await
    }

    pub async fn event_overview(&self, event_id: i64) -> Result<AnalyticsOverview, EventlyError> {
        self.get(&format!("/analytics/events/{event_id}/overview")).await
    }

    pub async fn event_sales(&self, event_id: i64) -> Result<Vec<SalesPoint>, EventlyError> {
        self.get(&format!("/analytics/events/{event_id}/sales")).await
    }

    // --- notifications ---

    pub async fn user_notifications(&self, user_id: i64) -> Result<Vec<Notification>, EventlyError> {
        self.get(&format!("/notifications/users/{user_id}")).await
    }

    pub async fn mark_notification_read(&self, id: i64) -> Result<Notification, EventlyError> {
        self.put_empty(&format!("/notifications/{id}/read")).await
    }

    // --- plumbing ---

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, EventlyError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await.map_err(EventlyError::from_request)?;
        Self::decode_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, EventlyError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");
        let response =
            self.http.post(&url).json(body).send().await.map_err(EventlyError::from_request)?;
        Self::decode_response(response).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, EventlyError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");
        let response = self.http.post(&url).send().await.map_err(EventlyError::from_request)?;
        Self::decode_response(response).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, EventlyError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "PUT");
        let response =
            self.http.put(&url).json(body).send().await.map_err(EventlyError::from_request)?;
        Self::decode_response(response).await
    }

    async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, EventlyError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "PUT");
        let response = self.http.put(&url).send().await.map_err(EventlyError::from_request)?;
        Self::decode_response(response).await
    }

    async fn decode_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, EventlyError> {
        let status = response.status();

        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(EventlyError::Server {
                status: status.as_u16(),
                message: extract_server_message(&raw),
            });
        }

        // Decode via text so a shape mismatch classifies as Decode rather
        // than disappearing into a transport error.
        let raw = response.text().await.map_err(EventlyError::from_request)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Pulls the `message` field out of an error body when the server sent one,
/// falling back to the raw body.
fn extract_server_message(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventStatus;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Minimal one-shot HTTP server: answers the first request with a canned
    // status/body pair and exits.
    async fn spawn_http_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, std::time::Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn successful_fetch_decodes_payload() {
        let base = spawn_http_once("200 OK", r#"[{"id":1,"title":"expo","status":"PUBLISHED"}]"#).await;
        let events = client(&base).list_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, EventStatus::Published);
    }

    #[tokio::test]
    async fn non_2xx_maps_to_server_error_with_message() {
        let base = spawn_http_once("403 Forbidden", r#"{"message":"wrong password"}"#).await;
        let err = client(&base).cancel_event(5, "nope").await.unwrap_err();
        match err {
            EventlyError::Server { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "wrong password");
            }
            other => panic!("expected Server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_payload_maps_to_decode_error() {
        let base = spawn_http_once("200 OK", r#"{"not":"a list"}"#).await;
        let err = client(&base).list_events().await.unwrap_err();
        assert!(matches!(err, EventlyError::Decode(_)));
    }

    #[tokio::test]
    async fn refused_connection_maps_to_network_error() {
        // Bind then drop so the port is very likely unoccupied.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}")).list_events().await.unwrap_err();
        assert!(matches!(err, EventlyError::Network(_)));
    }

    #[test]
    fn server_message_extraction_falls_back_to_raw_body() {
        assert_eq!(extract_server_message(r#"{"message":"nope"}"#), "nope");
        assert_eq!(extract_server_message("plain text"), "plain text");
    }
}
