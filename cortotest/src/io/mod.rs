//! I/O adapters for the orchestrator.

pub mod config;
pub mod loader;
pub mod probe;
pub mod process;
pub mod report;
