/// file: src/config.rs
/// description: runtime configuration and the session context assembled once
/// at the application boundary
use crate::cli::Args;
use anyhow::{Result, bail};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub websocket: WebSocketConfig,
    pub session: SessionContext,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    pub url: Url,
    pub reconnect_delay: Duration,
}

/// Who the client is acting as. Sourced once from the arguments and passed
/// explicitly to every component that needs it; nothing reads session
/// identity from ambient state.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: i64,
    pub role: Role,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Attendee,
    Organizer,
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let ws_url = Url::parse(&args.ws_url)?;
        // Validate the base URL even though reqwest takes it as a string.
        Url::parse(&args.base_url)?;

        let role = match args.role.to_ascii_lowercase().as_str() {
            "attendee" => Role::Attendee,
            "organizer" => Role::Organizer,
            other => bail!("unknown role '{other}', expected attendee or organizer"),
        };

        Ok(Config {
            api: ApiConfig {
                base_url: args.base_url.clone(),
                timeout: Duration::from_secs(args.timeout),
            },
            websocket: WebSocketConfig {
                url: ws_url,
                reconnect_delay: Duration::from_secs(args.reconnect_delay),
            },
            session: SessionContext {
                user_id: args.user_id,
                role,
                display_name: args.display_name.clone(),
            },
            metrics: MetricsConfig { enabled: args.metrics, port: args.metrics_port },
        })
    }
}
