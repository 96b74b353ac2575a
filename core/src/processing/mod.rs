pub mod listener;
pub mod retry;

pub use listener::{ListenerSettings, ListenerState, PointingListener, ProcessOutcome};
pub use retry::RetryPolicy;
