pub mod geometry;

pub use geometry::{BoundingBox, GeometryEngine};
