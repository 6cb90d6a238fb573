//! Background Tasks Module
//!
//! Contains the tasks spawned by the admin server.
//!
//! # Tasks
//! - Serve loop: accepts admin connections until cancelled

mod serve;

pub use serve::spawn_serve_task;
