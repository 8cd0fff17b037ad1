/// file: src/events.rs
/// description: event bus decoupling the live channel from the composition root
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Starting,
    Connecting { url: String },
    Connected { connection_id: String },
    SubscribeSent { topic: String },
    UnsubscribeSent { topic: String },
    MessageReceived { topic: String },
    Reconnecting { attempt: u32, delay_secs: u64 },
    Disconnected,
    Stopping,
}

// Bounded so a stalled consumer cannot grow memory without limit; push
// traffic on a dashboard is low-volume, so a small buffer is plenty.
const EVENT_CHANNEL_CAPACITY: usize = 1_024;

pub type EventSender = mpsc::Sender<ChannelEvent>;
pub type EventReceiver = mpsc::Receiver<ChannelEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}
