//! Stream relay and tee-logging engine: runs a child behind the caller's stdio and keeps a
//! raw, per-stream copy of everything that crosses it.

pub mod config;
pub mod error;
pub mod runner;
pub mod transcript;
pub mod util;
