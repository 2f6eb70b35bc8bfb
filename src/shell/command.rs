// ABOUTME: A remote shell command as an ordered list of argument values.
// ABOUTME: Renders unredacted for execution and redacted for display.

use std::fmt;

use super::value::Value;

/// A shell command line.
///
/// Tokens are flattened leaves: plain text or sensitive values. `Display`
/// renders the redacted form; [`Command::to_shell`] is the only way to get
/// the string that is actually executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    tokens: Vec<Value>,
}

impl Command {
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::default().args(tokens)
    }

    pub fn arg(mut self, token: impl Into<Value>) -> Self {
        self.tokens.extend(token.into().flatten());
        self
    }

    pub fn args<I, T>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        for token in tokens {
            self.tokens.extend(token.into().flatten());
        }
        self
    }

    /// `self | next`
    pub fn pipe(self, next: Command) -> Self {
        self.join("|", next)
    }

    /// `self && next`
    pub fn and(self, next: Command) -> Self {
        self.join("&&", next)
    }

    /// `self ; next`
    pub fn chain(self, next: Command) -> Self {
        self.join(";", next)
    }

    fn join(mut self, operator: &str, next: Command) -> Self {
        self.tokens.push(Value::from(operator));
        self.tokens.extend(next.tokens);
        self
    }

    pub fn tokens(&self) -> &[Value] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The command as it is sent to the remote shell.
    pub fn to_shell(&self) -> String {
        self.render(true)
    }

    /// The command as it may be logged or shown to an operator.
    pub fn redacted(&self) -> String {
        self.render(false)
    }

    fn render(&self, reveal: bool) -> String {
        self.tokens
            .iter()
            .map(|token| leaf_text(token, reveal))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn leaf_text(value: &Value, reveal: bool) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Sensitive(s) if reveal => s.unredacted().to_string(),
        Value::Sensitive(s) => s.redaction().to_string(),
        Value::Seq(items) => items
            .iter()
            .map(|v| leaf_text(v, reveal))
            .collect::<Vec<_>>()
            .join(" "),
        Value::Map(map) => map
            .iter()
            .map(|(k, v)| format!("{}={}", k, leaf_text(v, reveal)))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}
