//! Storage layer
//!
//! Sessions live in memory only (DashMap).

pub mod sessions;

pub use sessions::{SessionStore, DEFAULT_SESSION_TTL};
