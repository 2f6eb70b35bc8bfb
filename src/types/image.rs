// ABOUTME: Untagged image repository names.
// ABOUTME: The deployed version supplies the tag, so tags and digests are rejected.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use super::Version;

#[derive(Debug, Error)]
pub enum ImageNameError {
    #[error("image name cannot be empty")]
    Empty,

    #[error("invalid character in image name: '{0}'")]
    InvalidChar(char),

    #[error("image name must not include a tag or digest: {0}")]
    Tagged(String),
}

/// A repository such as `registry.example.com:5000/org/app`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct ImageName(String);

impl ImageName {
    pub fn new(value: &str) -> Result<Self, ImageNameError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ImageNameError::Empty);
        }

        if let Some(c) = value.chars().find(|c| {
            !c.is_ascii_alphanumeric() && !matches!(c, '/' | ':' | '.' | '-' | '_' | '@')
        }) {
            return Err(ImageNameError::InvalidChar(c));
        }

        // A colon after the last slash is a tag; before it, a registry port.
        let last_segment = value.rsplit('/').next().unwrap_or(value);
        if value.contains('@') || last_segment.contains(':') {
            return Err(ImageNameError::Tagged(value.to_string()));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<image>:<version>`
    pub fn tagged(&self, version: &Version) -> String {
        format!("{}:{}", self.0, version)
    }
}

impl TryFrom<String> for ImageName {
    type Error = ImageNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
