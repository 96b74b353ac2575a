//! Field-of-view target selection for telescope pointing events.
//!
//! A pointing published on the bus is lifted into a typed [`Pointing`], its
//! primary-beam footprint is bounded with RA/Dec boxes, the catalog is queried
//! with a box pre-filter plus an exact angular-separation cut, and the
//! resulting target list is stored and announced by key.

pub mod bus;
pub mod catalog;
pub mod interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use interface::{ObservationId, Pointing};
pub use prelude::{SelectorError, SelectorResult};
pub use processing::{ListenerSettings, PointingListener};
