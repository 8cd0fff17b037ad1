// file: src/channel.rs
// description: live-update channel maintaining one auto-reconnecting WebSocket
// connection per view and delivering topic-addressed push messages to handlers

use crate::{
    error::EventlyError,
    events::{ChannelEvent, EventSender},
    monitoring,
    types::{PushMessage, SubscriptionRequest},
};
use futures_util::{SinkExt, StreamExt, future::BoxFuture};
use std::collections::{HashMap, HashSet};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Handler invoked once per inbound message on a subscribed topic. Delivery
/// is sequential on the channel's dispatch task: no two handlers of the same
/// channel ever run concurrently, and same-topic messages keep transport
/// arrival order. Handlers must not subscribe or unsubscribe inline.
pub type PushHandler = Box<dyn Fn(serde_json::Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Returned by [`LiveChannel::subscribe`]; passing it back to
/// [`LiveChannel::unsubscribe`] detaches exactly that handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionToken {
    id: u64,
    topic: String,
}

impl SubscriptionToken {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    topics: HashMap<String, Vec<(u64, PushHandler)>>,
}

enum Command {
    Subscribe(String),
    Unsubscribe(String),
}

const COMMAND_CAPACITY: usize = 64;

/// One live connection per active view. The underlying transport reconnects
/// after a fixed delay, indefinitely: the client stays eventually consistent
/// instead of failing fast, and subscribers never observe the disconnects.
/// On every (re)connect the full registered topic set is re-announced, so a
/// drop never duplicates handler registrations.
pub struct LiveChannel {
    registry: Arc<Mutex<Registry>>,
    commands: mpsc::Sender<Command>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl LiveChannel {
    /// Spawns the connection worker and returns immediately; connection
    /// establishment and message delivery happen asynchronously.
    pub fn open(url: Url, reconnect_delay: Duration, events: EventSender) -> Self {
        let registry = Arc::new(Mutex::new(Registry::default()));
        let closed = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(Notify::new());
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);

        let worker = ChannelWorker {
            url,
            reconnect_delay,
            registry: registry.clone(),
            closed: closed.clone(),
            shutdown: shutdown.clone(),
            commands: command_rx,
            events,
            reconnect_attempt: 0,
        };
        let handle = tokio::spawn(worker.run());

        Self {
            registry,
            commands: command_tx,
            closed,
            shutdown,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Registers a handler for one topic. Multiple subscriptions to
    /// different topics share the single connection.
    pub async fn subscribe<F, Fut>(&self, topic: &str, handler: F) -> SubscriptionToken
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: PushHandler = Box::new(move |value| Box::pin(handler(value)));

        let (id, first) = {
            let mut registry = self.registry.lock().await;
            let id = registry.next_id;
            registry.next_id += 1;
            let handlers = registry.topics.entry(topic.to_string()).or_default();
            let first = handlers.is_empty();
            handlers.push((id, boxed));
            (id, first)
        };

        if first {
            // The worker announces the topic on the wire; if it is between
            // connections the registry snapshot covers it at reconnect.
            let _ = self.commands.send(Command::Subscribe(topic.to_string())).await;
        }

        SubscriptionToken { id, topic: topic.to_string() }
    }

    /// Detaches a handler. Idempotent: a token that was already detached
    /// (or whose channel is closed) is a no-op.
    pub async fn unsubscribe(&self, token: &SubscriptionToken) {
        let emptied = {
            let mut registry = self.registry.lock().await;
            let Some(handlers) = registry.topics.get_mut(&token.topic) else {
                return;
            };
            handlers.retain(|(id, _)| *id != token.id);
            let emptied = handlers.is_empty();
            if emptied {
                registry.topics.remove(&token.topic);
            }
            emptied
        };

        if emptied {
            let _ = self.commands.send(Command::Unsubscribe(token.topic.clone())).await;
        }
    }

    /// Tears down the connection and every subscription. After this returns
    /// no handler is invoked again; messages already in flight are dropped.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        {
            // Dispatch holds this lock while invoking handlers, so clearing
            // here also waits out any in-flight delivery turn.
            let mut registry = self.registry.lock().await;
            registry.topics.clear();
        }
        self.shutdown.notify_one();
        if let Some(handle) = self.worker.lock().await.take() {
            let _ = handle.await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

type WsSink = futures_util::stream::SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

struct ChannelWorker {
    url: Url,
    reconnect_delay: Duration,
    registry: Arc<Mutex<Registry>>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    commands: mpsc::Receiver<Command>,
    events: EventSender,
    reconnect_attempt: u32,
}

impl ChannelWorker {
    async fn run(mut self) {
        let _ = self.events.send(ChannelEvent::Starting).await;

        loop {
            if self.closed.load(Ordering::SeqCst) {
                break;
            }
            match self.connect_and_stream().await {
                Ok(()) => {
                    debug!("channel shut down");
                    break;
                }
                Err(e) => {
                    if self.closed.load(Ordering::SeqCst) {
                        break;
                    }
                    self.reconnect_attempt += 1;
                    monitoring::RECONNECT_COUNTER.increment(1);
                    warn!(
                        "connection lost ({}), reconnecting in {}s (attempt {})",
                        e,
                        self.reconnect_delay.as_secs(),
                        self.reconnect_attempt
                    );
                    let _ = self
                        .events
                        .send(ChannelEvent::Reconnecting {
                            attempt: self.reconnect_attempt,
                            delay_secs: self.reconnect_delay.as_secs(),
                        })
                        .await;

                    tokio::select! {
                        _ = sleep(self.reconnect_delay) => {}
                        _ = self.shutdown.notified() => break,
                    }
                }
            }
        }

        let _ = self.events.send(ChannelEvent::Stopping).await;
    }

    /// One connection lifetime: connect, announce the registered topic set,
    /// then pump messages and subscription commands until the transport
    /// drops or shutdown is requested. `Ok` means shutdown, `Err` means the
    /// run loop should reconnect.
    async fn connect_and_stream(&mut self) -> Result<(), EventlyError> {
        let _ = self.events.send(ChannelEvent::Connecting { url: self.url.to_string() }).await;

        // The handshake itself is raced against shutdown so close() cannot
        // hang behind an endpoint that never completes the connect.
        let ws_stream = tokio::select! {
            _ = self.shutdown.notified() => return Ok(()),
            result = connect_async(self.url.as_str()) => match result {
                Ok((ws_stream, _)) => ws_stream,
                Err(e) => {
                    error!("failed to connect to push endpoint: {}", e);
                    return Err(EventlyError::Channel(e));
                }
            },
        };

        let connection_id = uuid::Uuid::new_v4().to_string();
        info!("push connection {} established to {}", connection_id, self.url);
        monitoring::CONNECTED_GAUGE.set(1.0);
        self.reconnect_attempt = 0;
        let _ = self.events.send(ChannelEvent::Connected { connection_id }).await;

        let (mut write, mut read) = ws_stream.split();

        // Topics announced on this connection. Commands can lag the registry
        // snapshot (a subscriber may have enqueued one just before the
        // connect), so every announcement goes through this set: one
        // subscribe frame per topic per connection.
        let mut announced: HashSet<String> = HashSet::new();

        let topics: Vec<String> = {
            let registry = self.registry.lock().await;
            registry.topics.keys().cloned().collect()
        };
        for topic in topics {
            self.send_frame(&mut write, SubscriptionRequest::subscribe(&topic)).await?;
            announced.insert(topic.clone());
            let _ = self.events.send(ChannelEvent::SubscribeSent { topic }).await;
        }

        let result = loop {
            tokio::select! {
                _ = self.shutdown.notified() => break Ok(()),

                command = self.commands.recv() => match command {
                    Some(Command::Subscribe(topic)) => {
                        if announced.insert(topic.clone()) {
                            self.send_frame(&mut write, SubscriptionRequest::subscribe(&topic)).await?;
                            let _ = self.events.send(ChannelEvent::SubscribeSent { topic }).await;
                        }
                    }
                    Some(Command::Unsubscribe(topic)) => {
                        if announced.remove(&topic) {
                            self.send_frame(&mut write, SubscriptionRequest::unsubscribe(&topic)).await?;
                            let _ = self.events.send(ChannelEvent::UnsubscribeSent { topic }).await;
                        }
                    }
                    // Handle dropped without close(); stop quietly.
                    None => break Ok(()),
                },

                message = read.next() => match message {
                    Some(Ok(msg)) => self.handle_message(msg).await?,
                    Some(Err(e)) => break Err(EventlyError::Channel(e)),
                    None => break Err(EventlyError::ConnectionClosed),
                },
            }
        };

        monitoring::CONNECTED_GAUGE.set(0.0);
        let _ = self.events.send(ChannelEvent::Disconnected).await;
        result
    }

    async fn send_frame(
        &self,
        write: &mut WsSink,
        frame: SubscriptionRequest,
    ) -> Result<(), EventlyError> {
        let payload = serde_json::to_string(&frame)?;
        write.send(Message::Text(payload.into())).await.map_err(EventlyError::Channel)
    }

    async fn handle_message(&self, message: Message) -> Result<(), EventlyError> {
        match message {
            Message::Text(text) => {
                monitoring::MESSAGES_RECEIVED_COUNTER.increment(1);
                self.dispatch(&text).await;
            }
            Message::Binary(data) => {
                debug!("ignoring binary frame of {} bytes", data.len());
            }
            Message::Ping(_) | Message::Pong(_) => {
                trace!("keepalive frame");
            }
            Message::Close(frame) => {
                warn!("received close frame: {:?}", frame);
                return Err(EventlyError::ConnectionClosed);
            }
            Message::Frame(_) => {
                debug!("ignoring raw frame");
            }
        }
        Ok(())
    }

    /// Decodes the topic envelope and runs every handler registered for the
    /// topic, sequentially. An unparseable frame is logged and dropped, and
    /// never tears the connection down.
    async fn dispatch(&self, text: &str) {
        let frame: PushMessage = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(
                    "unparseable push frame: {}. payload: {}",
                    e,
                    text.chars().take(100).collect::<String>()
                );
                return;
            }
        };

        trace!(topic = %frame.topic, "push message");
        let _ = self.events.send(ChannelEvent::MessageReceived { topic: frame.topic.clone() }).await;

        let registry = self.registry.lock().await;
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        if let Some(handlers) = registry.topics.get(&frame.topic) {
            for (_, handler) in handlers {
                monitoring::PUSH_APPLIED_COUNTER.increment(1);
                handler(frame.body.clone()).await;
            }
        }
    }
}
