pub mod error;
pub mod flat;
pub mod xml;

pub use error::*;
pub use flat::*;
pub use xml::*;
