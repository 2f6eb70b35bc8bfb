// ABOUTME: Shell escaping for values interpolated into remote commands.
// ABOUTME: Keeps ${...} expansions live while neutralizing other metacharacters.

/// Escape a value for use inside a remote shell command.
///
/// The result is double-quoted. Backslashes, double quotes and backticks are
/// escaped, and so is any `$` that does not open a `${...}` expansion. Those
/// expansions are left intact so callers can reference variables that only
/// exist on the remote host.
pub fn escape_shell_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('"');

    for (i, c) in value.char_indices() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '`' => escaped.push_str("\\`"),
            '$' if opens_expansion(&value[i + 1..]) => escaped.push('$'),
            '$' => escaped.push_str("\\$"),
            _ => escaped.push(c),
        }
    }

    escaped.push('"');
    escaped
}

/// Whether the text after a `$` is a complete `{...}` group.
fn opens_expansion(rest: &str) -> bool {
    rest.strip_prefix('{')
        .is_some_and(|inner| inner.contains('}'))
}

/// POSIX single quoting: nothing inside is expanded.
pub fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
