pub mod cache;
pub mod page;
pub mod protocol;

pub use cache::*;
pub use page::*;
pub use protocol::*;
