use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "rs-evently",
    about = "live synchronization client for the Evently event-management platform",
    version
)]
pub struct Args {
    /// Base URL of the Evently REST API
    #[arg(long, default_value = "http://localhost:8080/api")]
    pub base_url: String,

    /// Push endpoint URL for the live-update channel
    #[arg(long, default_value = "ws://localhost:8080/ws")]
    pub ws_url: String,

    /// User id parameterizing requests and per-user topics
    #[arg(short, long)]
    pub user_id: i64,

    /// Session role: attendee or organizer
    #[arg(short, long, default_value = "attendee")]
    pub role: String,

    /// Display name shown by the session
    #[arg(long, default_value = "")]
    pub display_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,

    /// Enable metrics server
    #[arg(long)]
    pub metrics: bool,

    /// Metrics server port
    #[arg(long, default_value = "9090")]
    pub metrics_port: u16,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Reconnection delay in seconds
    #[arg(long, default_value = "5")]
    pub reconnect_delay: u64,
}
