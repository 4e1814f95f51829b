//! CLI commands

pub mod analyze;
pub mod config;
pub mod connection;
pub mod convert;
