//! HTTP handlers

pub mod analyses;
pub mod connection;
pub mod conversions;
pub mod downloads;
pub mod health;
pub mod sessions;

pub use health::health;
