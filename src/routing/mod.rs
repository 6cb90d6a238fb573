//! Routing Module
//!
//! The route table shared by every subsystem that contributes admin endpoints.

mod table;

pub use table::{Access, RouteTable, ALL_METHODS};
