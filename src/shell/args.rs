// ABOUTME: Builders for flag/attribute argument lists and --option lists.
// ABOUTME: Values are shell-escaped; attribute pairs can be marked sensitive.

use serde::Deserialize;
use std::borrow::Borrow;

use super::escape::escape_shell_value;
use super::value::{REDACTED, Sensitive, Value};

/// How an attribute pair should be displayed.
#[derive(Clone, Copy)]
pub enum Redaction<'a> {
    /// Shown as-is.
    Clear,
    /// Shown as `key=[REDACTED]`.
    Default,
    /// Shown as whatever the function returns for the key.
    With(&'a dyn Fn(&str) -> String),
}

/// Build `flag key=value` pairs from attributes.
///
/// A blank value yields `flag key`, a bare flag with no assignment.
pub fn argumentize<I, K, V>(flag: &str, attributes: I, redaction: Redaction<'_>) -> Vec<Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    attributes
        .into_iter()
        .flat_map(|(key, value)| {
            let key = key.as_ref();
            let value = value.as_ref();

            if value.trim().is_empty() {
                return [Value::from(flag), Value::from(key)];
            }

            let attr = format!("{}={}", key, escape_shell_value(value));
            let attr = match redaction {
                Redaction::Clear => Value::Text(attr),
                Redaction::Default => {
                    Value::Sensitive(Sensitive::new(attr, format!("{key}={REDACTED}")))
                }
                Redaction::With(display) => Value::Sensitive(Sensitive::new(attr, display(key))),
            };
            [Value::from(flag), attr]
        })
        .collect()
}

/// Value of a `--key` style option.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawOpt")]
pub enum Opt {
    /// A valueless flag, `--key`.
    Flag,
    Value(String),
    /// Repeated option, one `--key` per entry.
    Values(Vec<String>),
}

impl From<&str> for Opt {
    fn from(s: &str) -> Self {
        Opt::Value(s.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOpt {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl From<RawOpt> for Opt {
    fn from(raw: RawOpt) -> Self {
        match raw {
            RawOpt::Bool(true) => Opt::Flag,
            RawOpt::Bool(false) => Opt::Value("false".to_string()),
            RawOpt::Int(n) => Opt::Value(n.to_string()),
            RawOpt::Float(n) => Opt::Value(n.to_string()),
            RawOpt::Text(s) => Opt::Value(s),
            RawOpt::List(items) => Opt::Values(items),
        }
    }
}

/// Build `--key value` options.
///
/// With a separator each option is a single token, `--key<sep>value`;
/// without one the escaped value follows as its own token.
pub fn optionize<I, K, O>(options: I, separator: Option<&str>) -> Vec<Value>
where
    I: IntoIterator<Item = (K, O)>,
    K: AsRef<str>,
    O: Borrow<Opt>,
{
    let mut out = Vec::new();

    for (key, opt) in options {
        let key = key.as_ref();
        let values: Vec<&str> = match opt.borrow() {
            Opt::Flag => {
                out.push(Value::Text(format!("--{key}")));
                continue;
            }
            Opt::Value(v) => vec![v.as_str()],
            Opt::Values(vs) => vs.iter().map(String::as_str).collect(),
        };

        for value in values {
            let escaped = escape_shell_value(value);
            match separator {
                Some(sep) => out.push(Value::Text(format!("--{key}{sep}{escaped}"))),
                None => {
                    out.push(Value::Text(format!("--{key}")));
                    out.push(Value::Text(escaped));
                }
            }
        }
    }

    out
}
