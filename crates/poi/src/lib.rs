pub mod coerce;
pub mod components;
pub mod entity;
pub mod properties;

pub use coerce::*;
pub use components::*;
pub use entity::*;
pub use properties::*;
