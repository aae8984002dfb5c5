pub mod action;
pub mod animation;
pub mod object;
pub mod transform;

pub use action::*;
pub use animation::*;
pub use object::*;
pub use transform::*;
