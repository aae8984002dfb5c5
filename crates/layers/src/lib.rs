pub mod connector;
pub mod layer;
pub mod query;
pub mod ranking;

pub use connector::*;
pub use layer::*;
pub use query::*;
pub use ranking::*;
