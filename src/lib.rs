// ABOUTME: Library root for cutover - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod cord;
pub mod deploy;
pub mod docker;
pub mod error;
pub mod executor;
pub mod healthcheck;
pub mod output;
pub mod shell;
pub mod ssh;
pub mod types;
