use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::bus::{BusError, BusResult, MessageBus, Subscription};

#[derive(Default)]
struct BusState {
    channels: HashMap<String, Vec<UnboundedSender<String>>>,
    store: HashMap<String, String>,
}

/// In-process bus. Clones share the same channels and key/value store.
#[derive(Clone, Default)]
pub struct MemoryBus {
    state: Arc<Mutex<BusState>>,
}

pub struct MemorySubscription {
    receiver: UnboundedReceiver<String>,
}

impl Subscription for MemorySubscription {
    fn next_message(&mut self) -> Option<String> {
        self.receiver.blocking_recv()
    }
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every subscriber of `channel`. Subscribers still drain queued
    /// messages before observing the close.
    pub fn close(&self, channel: &str) -> BusResult<()> {
        let mut state = self.state.lock().map_err(|_| BusError::Poisoned)?;
        state.channels.remove(channel);
        Ok(())
    }
}

impl MessageBus for MemoryBus {
    type Subscription = MemorySubscription;

    fn subscribe(&self, channel: &str) -> BusResult<MemorySubscription> {
        let (sender, receiver) = unbounded_channel();
        let mut state = self.state.lock().map_err(|_| BusError::Poisoned)?;
        state
            .channels
            .entry(channel.to_string())
            .or_default()
            .push(sender);
        Ok(MemorySubscription { receiver })
    }

    fn publish(&self, channel: &str, message: &str) -> BusResult<usize> {
        let mut state = self.state.lock().map_err(|_| BusError::Poisoned)?;
        let Some(senders) = state.channels.get_mut(channel) else {
            return Ok(0);
        };
        senders.retain(|sender| sender.send(message.to_string()).is_ok());
        Ok(senders.len())
    }

    fn set(&self, key: &str, value: &str) -> BusResult<()> {
        let mut state = self.state.lock().map_err(|_| BusError::Poisoned)?;
        state.store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> BusResult<Option<String>> {
        let state = self.state.lock().map_err(|_| BusError::Poisoned)?;
        Ok(state.store.get(key).cloned())
    }
}
