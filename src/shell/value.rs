// ABOUTME: Argument values that may carry a secret alongside its display form.
// ABOUTME: Redaction and unredaction recurse through sequences and mappings.

use std::collections::BTreeMap;
use std::fmt;

/// Default display form for a sensitive value.
pub const REDACTED: &str = "[REDACTED]";

/// A value that must never appear in logs or human-visible output.
///
/// `Debug` and `Display` both show the redaction; the real value is only
/// reachable through [`Sensitive::unredacted`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Sensitive {
    value: String,
    redaction: String,
}

impl Sensitive {
    pub fn new(value: impl Into<String>, redaction: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            redaction: redaction.into(),
        }
    }

    pub fn unredacted(&self) -> &str {
        &self.value
    }

    pub fn redaction(&self) -> &str {
        &self.redaction
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sensitive").field(&self.redaction).finish()
    }
}

impl fmt::Display for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redaction)
    }
}

/// A (possibly nested) argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Sensitive(Sensitive),
    Seq(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Flatten nested sequences into their leaves, in order.
    ///
    /// Sensitive leaves are moved as-is, so their redaction survives.
    /// Mappings are leaves too: they have no positional meaning.
    pub fn flatten(self) -> Vec<Value> {
        match self {
            Value::Seq(items) => items.into_iter().flat_map(Value::flatten).collect(),
            leaf => vec![leaf],
        }
    }

    pub fn is_sensitive(&self) -> bool {
        matches!(self, Value::Sensitive(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<Sensitive> for Value {
    fn from(s: Sensitive) -> Self {
        Value::Sensitive(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(map: BTreeMap<String, T>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Wrap a value for redaction, defaulting the display form to `[REDACTED]`.
pub fn sensitive(value: impl Into<String>, redaction: Option<&str>) -> Value {
    Value::Sensitive(Sensitive::new(value, redaction.unwrap_or(REDACTED)))
}

/// Replace every sensitive leaf with its redaction, keeping structure.
pub fn redacted(value: &Value) -> Value {
    match value {
        Value::Sensitive(s) => Value::Text(s.redaction().to_string()),
        Value::Seq(items) => Value::Seq(items.iter().map(redacted).collect()),
        Value::Map(map) => Value::Map(map.iter().map(|(k, v)| (k.clone(), redacted(v))).collect()),
        Value::Text(_) => value.clone(),
    }
}

/// Replace every sensitive leaf with its real value, keeping structure.
pub fn unredacted(value: &Value) -> Value {
    match value {
        Value::Sensitive(s) => Value::Text(s.unredacted().to_string()),
        Value::Seq(items) => Value::Seq(items.iter().map(unredacted).collect()),
        Value::Map(map) => {
            Value::Map(map.iter().map(|(k, v)| (k.clone(), unredacted(v))).collect())
        }
        Value::Text(_) => value.clone(),
    }
}
