//! Shared utilities for stock-ranker
//!
//! Logging setup and process-level configuration used by the binary.

pub mod config;
pub mod logging;

pub use config::{Config, LogFormat};
pub use logging::{init_tracing, try_init_tracing};
