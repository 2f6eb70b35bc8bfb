// ABOUTME: SSH transport to target hosts, built on russh.
// ABOUTME: Key file, agent or default-key auth with known_hosts verification.

mod auth;
mod config;
mod error;
mod host_keys;
mod session;

pub use config::SessionConfig;
pub use error::{Error, Result};
pub use session::Session;
