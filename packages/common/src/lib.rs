pub mod error;
pub mod store;
pub mod visitor;

pub use error::*;
pub use store::*;
pub use visitor::*;
