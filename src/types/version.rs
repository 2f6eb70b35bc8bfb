// ABOUTME: Deployable version identifiers (commit hashes or uncommitted builds).
// ABOUTME: Versions name containers and tag images, so they must be shell-safe.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Marker inserted between a commit hash and the build timestamp.
const UNCOMMITTED: &str = "_uncommitted_";

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("version cannot be empty")]
    Empty,

    #[error("invalid character in version: '{0}'")]
    InvalidChar(char),
}

/// An opaque version identifier.
///
/// Either a content hash (`a1b2c3d4e5f6`) or a hash with an uncommitted
/// suffix (`a1b2c3d4e5f6_uncommitted_1699999999`). Equality is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Version(String);

impl Version {
    pub fn new(value: &str) -> Result<Self, VersionError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(VersionError::Empty);
        }

        // Docker container names allow [a-zA-Z0-9_.-]
        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '-'))
        {
            return Err(VersionError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    /// Version for a build from a working tree with uncommitted changes.
    pub fn uncommitted(commit: &str) -> Result<Self, VersionError> {
        let timestamp = chrono::Utc::now().timestamp();
        Self::new(&format!("{}{}{}", commit.trim(), UNCOMMITTED, timestamp))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_uncommitted(&self) -> bool {
        self.0.contains(UNCOMMITTED)
    }

    /// Short form for display: the first 7 characters of a plain hash.
    ///
    /// Identifiers containing `_` (uncommitted or renamed) are returned whole.
    pub fn abbreviated(&self) -> &str {
        if self.0.contains('_') {
            return &self.0;
        }
        match self.0.char_indices().nth(7) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
