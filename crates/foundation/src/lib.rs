//! Small, well-tested primitives: geodesy, prefilter boxes and POI ids.

pub mod bounds;
pub mod ids;
pub mod math;

pub use bounds::*;
pub use ids::*;
