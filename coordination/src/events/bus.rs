//! Event bus for UI coordination events
//!
//! Pub/sub over a Tokio broadcast channel. Publishing never blocks and never
//! fails for lack of subscribers.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use super::types::{EventId, PublishedEvent, UiEvent};
use crate::config::DEFAULT_EVENT_CAPACITY;
use crate::error::{CoordinationError, CoordinationResult};

/// Bus handle shared between the coordinator and its observers.
pub type SharedEventBus = Arc<EventBus>;

pub struct EventBus {
    sender: broadcast::Sender<PublishedEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Bus buffering up to `capacity` events per lagging subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Wrap in an `Arc` for sharing.
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Broadcast `event` under a fresh id and return that id. Subscribers
    /// receive it on the [`PublishedEvent`].
    pub fn publish(&self, event: UiEvent) -> CoordinationResult<EventId> {
        let published = PublishedEvent::new(event);
        let event_type = published.event_type();
        let event_id = published.id.clone();
        if self.sender.receiver_count() == 0 {
            debug!(event_type, %event_id, "Event published (no receivers)");
            return Ok(event_id);
        }
        match self.sender.send(published) {
            Ok(count) => {
                debug!(event_type, %event_id, receivers = count, "Event published");
                Ok(event_id)
            }
            Err(e) => Err(CoordinationError::PublishFailed(e.to_string())),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscription filter on [`UiEvent::event_type`].
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// `None` matches everything.
    pub event_types: Option<Vec<String>>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only pass the named event types.
    pub fn types(mut self, event_types: Vec<&str>) -> Self {
        self.event_types = Some(event_types.into_iter().map(String::from).collect());
        self
    }

    pub fn matches(&self, event: &UiEvent) -> bool {
        match &self.event_types {
            Some(types) => types.iter().any(|t| t == event.event_type()),
            None => true,
        }
    }
}

/// Receiver that skips events the filter rejects.
pub struct FilteredReceiver {
    receiver: broadcast::Receiver<PublishedEvent>,
    filter: EventFilter,
}

impl FilteredReceiver {
    pub fn new(receiver: broadcast::Receiver<PublishedEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Wait for the next matching event.
    pub async fn recv(&mut self) -> Result<PublishedEvent, broadcast::error::RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.filter.matches(&event.event) {
                return Ok(event);
            }
        }
    }

    /// Drain the matching events that are already buffered.
    pub fn drain(&mut self) -> Vec<PublishedEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event.event) => events.push(event),
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }
}

pub trait EventBusExt {
    fn subscribe_filtered(&self, filter: EventFilter) -> FilteredReceiver;
}

impl EventBusExt for EventBus {
    fn subscribe_filtered(&self, filter: EventFilter) -> FilteredReceiver {
        FilteredReceiver::new(self.subscribe(), filter)
    }
}

impl EventBusExt for SharedEventBus {
    fn subscribe_filtered(&self, filter: EventFilter) -> FilteredReceiver {
        FilteredReceiver::new(self.subscribe(), filter)
    }
}
