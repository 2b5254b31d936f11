//! Event fan-out from radio callbacks to the host's event streams.
//!
//! Each channel holds at most one subscriber. Subscribing again replaces the
//! previous listener, and events published while nobody listens are dropped.
//! Delivery happens inline on the publishing thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::trace;
use tokio::sync::mpsc;

use crate::core::bluetooth::constants::{DISCOVERY_CHANNEL, STATE_CHANNEL};
use crate::core::bluetooth::types::DevicePayload;

/// Identifies one of the two event streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    AdapterState,
    Discovery,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Self::AdapterState => STATE_CHANNEL,
            Self::Discovery => DISCOVERY_CHANNEL,
        }
    }
}

/// An event ready to be delivered to a channel's subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    AdapterState(i32),
    Discovery(DevicePayload),
}

impl BridgeEvent {
    pub fn channel(&self) -> Channel {
        match self {
            Self::AdapterState(_) => Channel::AdapterState,
            Self::Discovery(_) => Channel::Discovery,
        }
    }
}

/// Returned by `subscribe_*`; pass it back to [`EventMultiplexer::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    channel: Channel,
    id: u64,
}

impl SubscriptionHandle {
    pub fn channel(&self) -> Channel {
        self.channel
    }
}

type Listener<T> = Arc<dyn Fn(T) + Send + Sync>;

/// A single-subscriber slot.
struct EventSink<T> {
    listener: Mutex<Option<(u64, Listener<T>)>>,
}

impl<T> EventSink<T> {
    fn new() -> Self {
        Self {
            listener: Mutex::new(None),
        }
    }

    fn attach(&self, id: u64, listener: Listener<T>) {
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some((id, listener));
    }

    fn detach(&self, id: u64) -> bool {
        let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some((current, _)) if *current == id => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    fn is_attached(&self) -> bool {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Runs the listener, if any, outside the slot lock so that it may
    /// resubscribe or unsubscribe from within the callback.
    fn send(&self, payload: T) -> bool {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, listener)| listener.clone());
        match listener {
            Some(listener) => {
                listener(payload);
                true
            }
            None => false,
        }
    }
}

/// Routes adapter-state and discovery events to their current subscribers.
pub struct EventMultiplexer {
    next_id: AtomicU64,
    state: EventSink<i32>,
    discovery: EventSink<DevicePayload>,
}

impl Default for EventMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}

impl EventMultiplexer {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            state: EventSink::new(),
            discovery: EventSink::new(),
        }
    }

    fn handle(&self, channel: Channel) -> SubscriptionHandle {
        SubscriptionHandle {
            channel,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Registers the adapter-state listener, replacing any previous one.
    pub fn subscribe_state<F>(&self, listener: F) -> SubscriptionHandle
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        let handle = self.handle(Channel::AdapterState);
        self.state.attach(handle.id, Arc::new(listener));
        handle
    }

    /// Registers the discovery listener, replacing any previous one.
    pub fn subscribe_discovery<F>(&self, listener: F) -> SubscriptionHandle
    where
        F: Fn(DevicePayload) + Send + Sync + 'static,
    {
        let handle = self.handle(Channel::Discovery);
        self.discovery.attach(handle.id, Arc::new(listener));
        handle
    }

    /// Subscribes a channel and forwards its events into an unbounded queue,
    /// for consumers that live on an async task.
    pub fn subscribe_channel(&self, channel: Channel) -> (SubscriptionHandle, mpsc::UnboundedReceiver<BridgeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = match channel {
            Channel::AdapterState => self.subscribe_state(move |status| {
                let _ = tx.send(BridgeEvent::AdapterState(status));
            }),
            Channel::Discovery => self.subscribe_discovery(move |device| {
                let _ = tx.send(BridgeEvent::Discovery(device));
            }),
        };
        (handle, rx)
    }

    /// Detaches the subscriber behind `handle`.
    ///
    /// A handle that was already replaced by a newer subscription is ignored,
    /// so a stale unsubscribe never removes the current listener.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        match handle.channel {
            Channel::AdapterState => self.state.detach(handle.id),
            Channel::Discovery => self.discovery.detach(handle.id),
        }
    }

    pub fn has_subscriber(&self, channel: Channel) -> bool {
        match channel {
            Channel::AdapterState => self.state.is_attached(),
            Channel::Discovery => self.discovery.is_attached(),
        }
    }

    /// Delivers an event to its channel's subscriber. Returns false when the
    /// event was dropped because nobody was listening.
    pub fn publish(&self, event: BridgeEvent) -> bool {
        let channel = event.channel();
        let delivered = match event {
            BridgeEvent::AdapterState(status) => self.state.send(status),
            BridgeEvent::Discovery(device) => self.discovery.send(device),
        };
        if !delivered {
            trace!("No subscriber on {}, event dropped", channel.name());
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    fn device(address: &str) -> DevicePayload {
        DevicePayload {
            name: String::new(),
            address: address.to_string(),
            device_type: 0,
            is_connected: false,
            bond_state: 10,
            rssi: -70,
        }
    }

    #[test]
    fn channel_names_match_host_subscriptions() {
        assert_eq!(Channel::AdapterState.name(), "flutter_bluetooth_serial/state");
        assert_eq!(Channel::Discovery.name(), "flutter_bluetooth_serial/discovery");
        assert_eq!(BridgeEvent::AdapterState(12).channel(), Channel::AdapterState);
    }

    #[test]
    fn publish_without_subscriber_is_dropped_not_buffered() {
        let events = EventMultiplexer::new();
        assert!(!events.publish(BridgeEvent::AdapterState(12)));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        events.subscribe_state(move |status| sink.lock().unwrap().push(status));
        assert!(seen.lock().unwrap().is_empty());

        assert!(events.publish(BridgeEvent::AdapterState(10)));
        assert_eq!(*seen.lock().unwrap(), vec![10]);
    }

    #[test]
    fn newest_subscription_wins() {
        let events = EventMultiplexer::new();
        let first = Arc::new(AtomicI32::new(0));
        let second = Arc::new(AtomicI32::new(0));

        let counter = first.clone();
        let old = events.subscribe_state(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = second.clone();
        events.subscribe_state(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.publish(BridgeEvent::AdapterState(12));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        // The replaced handle no longer owns the slot.
        assert!(!events.unsubscribe(old));
        assert!(events.has_subscriber(Channel::AdapterState));
    }

    #[test]
    fn unsubscribe_detaches() {
        let events = EventMultiplexer::new();
        let handle = events.subscribe_discovery(|_| panic!("listener must be detached"));
        assert_eq!(handle.channel(), Channel::Discovery);
        assert!(events.unsubscribe(handle));
        assert!(!events.has_subscriber(Channel::Discovery));
        assert!(!events.publish(BridgeEvent::Discovery(device("x"))));
    }

    #[test]
    fn channels_are_independent() {
        let events = EventMultiplexer::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        events.subscribe_discovery(move |device| sink.lock().unwrap().push(device.address));

        assert!(!events.publish(BridgeEvent::AdapterState(12)));
        assert!(events.publish(BridgeEvent::Discovery(device("AA:BB"))));
        assert_eq!(*seen.lock().unwrap(), vec!["AA:BB".to_string()]);
    }

    #[test]
    fn listener_may_unsubscribe_itself() {
        let events = Arc::new(EventMultiplexer::new());
        let slot = Arc::new(Mutex::new(None::<SubscriptionHandle>));
        let (mux, own) = (events.clone(), slot.clone());
        let handle = events.subscribe_state(move |_| {
            if let Some(handle) = own.lock().unwrap().take() {
                mux.unsubscribe(handle);
            }
        });
        *slot.lock().unwrap() = Some(handle);

        assert!(events.publish(BridgeEvent::AdapterState(12)));
        assert!(!events.has_subscriber(Channel::AdapterState));
    }

    #[tokio::test]
    async fn channel_subscription_forwards_into_queue() {
        let events = EventMultiplexer::new();
        let (handle, mut rx) = events.subscribe_channel(Channel::AdapterState);
        events.publish(BridgeEvent::AdapterState(12));
        events.publish(BridgeEvent::AdapterState(10));
        assert_eq!(rx.recv().await, Some(BridgeEvent::AdapterState(12)));
        assert_eq!(rx.recv().await, Some(BridgeEvent::AdapterState(10)));

        events.unsubscribe(handle);
        assert_eq!(rx.recv().await, None);
    }
}
