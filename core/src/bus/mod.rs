//! Publish/subscribe and key/value access to the message bus.
//!
//! The listener only depends on the [`MessageBus`] trait; [`MemoryBus`] is an
//! in-process implementation with the same semantics as a pub/sub broker
//! paired with a string key/value store.

pub mod memory;

pub use memory::{MemoryBus, MemorySubscription};

#[derive(thiserror::Error, Debug)]
pub enum BusError {
    #[error("bus state lock poisoned")]
    Poisoned,
}

pub type BusResult<T> = Result<T, BusError>;

/// A persistent subscription to one channel.
pub trait Subscription {
    /// Blocks until the next message arrives. `None` once the channel is closed.
    fn next_message(&mut self) -> Option<String>;
}

pub trait MessageBus {
    type Subscription: Subscription;

    fn subscribe(&self, channel: &str) -> BusResult<Self::Subscription>;

    /// Returns the number of subscribers the message was delivered to.
    fn publish(&self, channel: &str, message: &str) -> BusResult<usize>;

    fn set(&self, key: &str, value: &str) -> BusResult<()>;

    fn get(&self, key: &str) -> BusResult<Option<String>>;
}
