use anyhow::Result;
use clap::Parser;
use rs_evently::{
    api::ApiClient,
    channel::LiveChannel,
    cli::Args,
    config::{Config, Role},
    events::{ChannelEvent, create_event_channel},
    monitoring::setup_metrics,
    store::SyncStore,
    tracing_setup::setup_tracing,
    views::{AnalyticsView, BrowseEventsView, NotificationsView, OrganizerEventsView, RegistrationsView},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing(&args.log_level, args.json_logs)?;

    info!("starting rs-evently v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::from_args(&args)?);

    if config.metrics.enabled {
        setup_metrics(config.metrics.port).await?;
    }

    let api = Arc::new(ApiClient::new(&config.api.base_url, config.api.timeout)?);
    let (event_tx, mut event_rx) = create_event_channel();
    let channel = Arc::new(LiveChannel::open(
        config.websocket.url.clone(),
        config.websocket.reconnect_delay,
        event_tx,
    ));

    let session = &config.session;
    info!(user_id = session.user_id, role = ?session.role, "session established");

    // Each view owns its cache; nothing persists across navigation.
    let mut notifications = NotificationsView::mount(
        api.clone(),
        channel.clone(),
        SyncStore::shared(),
        session.user_id,
    )
    .await?;

    match session.role {
        Role::Attendee => {
            let mut browse =
                BrowseEventsView::mount(api.clone(), channel.clone(), SyncStore::shared()).await?;
            let mut registrations =
                RegistrationsView::mount(api.clone(), SyncStore::shared(), session.user_id).await?;

            run_event_loop(&mut event_rx).await;

            registrations.unmount().await;
            browse.unmount().await;
        }
        Role::Organizer => {
            let mut dashboard = OrganizerEventsView::mount(
                api.clone(),
                channel.clone(),
                SyncStore::shared(),
                session.user_id,
            )
            .await?;
            let mut analytics = AnalyticsView::mount(
                api.clone(),
                channel.clone(),
                SyncStore::shared(),
                session.user_id,
            )
            .await?;

            run_event_loop(&mut event_rx).await;

            analytics.unmount().await;
            dashboard.unmount().await;
        }
    }

    notifications.unmount().await;
    channel.close().await;

    info!("client stopped");
    Ok(())
}

/// Logs channel lifecycle events until ctrl-c.
async fn run_event_loop(event_rx: &mut rs_evently::events::EventReceiver) {
    info!("client running, press ctrl-c to stop");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
            event = event_rx.recv() => match event {
                Some(ChannelEvent::Connected { connection_id }) => {
                    info!("live channel connected ({connection_id})");
                }
                Some(ChannelEvent::Reconnecting { attempt, delay_secs }) => {
                    warn!("live channel reconnecting in {delay_secs}s (attempt {attempt})");
                }
                Some(ChannelEvent::Disconnected) => {
                    warn!("live channel disconnected");
                }
                Some(event) => debug!(?event, "channel event"),
                None => break,
            },
        }
    }
}
