mod service;
mod store;
mod valuation;

pub use service::*;
pub use store::*;
pub use valuation::*;
