use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventlyError {
    /// No response received at all: connection refused, DNS failure, timeout.
    #[error("network error: {0}")]
    Network(reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A payload arrived but did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Transport-level WebSocket failure; absorbed by the reconnect loop
    /// rather than surfaced to subscribers.
    #[error("channel error: {0}")]
    Channel(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed unexpectedly")]
    ConnectionClosed,

    #[error("metrics server error: {0}")]
    Metrics(String),
}

impl EventlyError {
    /// Maps a reqwest failure onto the error taxonomy: a failure carrying a
    /// status becomes a server error, anything without one (refused
    /// connection, timeout) is a network error.
    pub fn from_request(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            EventlyError::Server { status: status.as_u16(), message: err.to_string() }
        } else {
            EventlyError::Network(err)
        }
    }
}
