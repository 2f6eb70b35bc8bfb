// ABOUTME: Env file rendering for containers, resolving secrets at build time.
// ABOUTME: Secret keys come from the process environment, clear keys are literal.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::ShellError;

/// Environment for a container, split into clear values and secret keys.
///
/// Deserializes from either `{ clear: {..}, secret: [..] }` or a flat
/// mapping, which is treated as all clear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawEnv")]
pub struct EnvSpec {
    pub clear: BTreeMap<String, String>,
    pub secret: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEnv {
    Split(SplitEnv),
    Flat(BTreeMap<String, String>),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SplitEnv {
    #[serde(default)]
    clear: BTreeMap<String, String>,
    #[serde(default)]
    secret: Vec<String>,
}

impl From<RawEnv> for EnvSpec {
    fn from(raw: RawEnv) -> Self {
        match raw {
            RawEnv::Split(SplitEnv { clear, secret }) => EnvSpec { clear, secret },
            RawEnv::Flat(clear) => EnvSpec {
                clear,
                secret: Vec::new(),
            },
        }
    }
}

impl EnvSpec {
    /// Layer `other` on top: clear values override, secret keys accumulate.
    pub fn merged(&self, other: &EnvSpec) -> EnvSpec {
        let mut merged = self.clone();
        merged
            .clear
            .extend(other.clear.iter().map(|(k, v)| (k.clone(), v.clone())));
        for key in &other.secret {
            if !merged.secret.contains(key) {
                merged.secret.push(key.clone());
            }
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.clear.is_empty() && self.secret.is_empty()
    }
}

/// Render `KEY=value` lines, secrets first.
///
/// Never returns an empty string: an empty env renders as a single newline
/// so that uploading it still produces a file.
pub fn env_file_with_secrets(env: &EnvSpec) -> Result<String, ShellError> {
    let mut contents = String::new();

    for key in &env.secret {
        let value =
            std::env::var(key).map_err(|_| ShellError::MissingEnvVar(key.clone()))?;
        contents.push_str(&env_file_line(key, &value)?);
    }

    for (key, value) in &env.clear {
        contents.push_str(&env_file_line(key, value)?);
    }

    if contents.is_empty() {
        contents.push('\n');
    }
    Ok(contents)
}

fn env_file_line(key: &str, value: &str) -> Result<String, ShellError> {
    if key.contains('\n') || value.contains('\n') {
        return Err(ShellError::InvalidEnvLine(key.to_string()));
    }
    Ok(format!("{key}={value}\n"))
}
