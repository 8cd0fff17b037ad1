#![doc = include_str!("../docs/rustdoc.md")]

/// REST fetch layer for entity snapshots and user actions.
pub mod api;
/// Live-update channel: one auto-reconnecting connection per view.
pub mod channel;
/// Command-line argument definitions.
pub mod cli;
/// Runtime configuration model and session context.
pub mod config;
/// Error types used across the crate.
pub mod error;
/// Event bus messages between the channel and the composition root.
pub mod events;
/// Metrics setup and counters.
pub mod monitoring;
/// Reconciler owning the local entity cache.
pub mod store;
/// Tracing/logging initialization.
pub mod tracing_setup;
/// Evently data models, lifecycle enums, and wire frames.
pub mod types;
/// View controllers tying fetch, channel, and store together.
pub mod views;

/// Primary crate error type.
pub use error::EventlyError;
