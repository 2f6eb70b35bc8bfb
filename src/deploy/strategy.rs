// ABOUTME: Cutover strategy selection based on role capabilities.
// ABOUTME: Barrier-coordinated cord drain, or registration with the reverse proxy.

use crate::config::Role;

/// How traffic moves from the old container to the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutoverStrategy {
    /// Drain the old container through its cord before stopping it.
    Barrier,

    /// Register the new container with the reverse proxy, which stops
    /// routing to the old one itself.
    Proxy,
}

impl CutoverStrategy {
    /// Pick the strategy for a role.
    /// Returns a note when part of the role's configuration is ignored.
    pub fn for_role(role: &Role) -> (Self, Option<&'static str>) {
        if role.proxy {
            let note = role
                .cord
                .then_some("cord is ignored for proxied roles: the proxy drains connections");
            (CutoverStrategy::Proxy, note)
        } else {
            (CutoverStrategy::Barrier, None)
        }
    }

    /// Whether the old container is drained through its cord.
    pub fn drains_with_cord(self, role: &Role) -> bool {
        self == CutoverStrategy::Barrier && role.cord
    }
}
