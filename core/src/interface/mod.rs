pub mod payload;
pub mod pointing;

pub use payload::{ResultFormatter, ResultPayload, TargetEntry};
pub use pointing::{ObservationId, Pointing};
