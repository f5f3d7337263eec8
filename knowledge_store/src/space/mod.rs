//! Space module - the store and the queries that run against it.

mod pattern;
mod store;

pub use pattern::*;
pub use store::*;
