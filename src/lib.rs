//! Gatehouse server library
//!
//! Exposes the CLI, configuration and HTTP server for the binary and for
//! integration testing.

pub mod cli;
pub mod config;
pub mod server;

pub use config::{ConfigError, GatehouseConfig};
