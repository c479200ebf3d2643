//! HTTP API handlers for ddosmon

pub mod handlers;

pub use handlers::{cpu_usage, health, network_usage};
