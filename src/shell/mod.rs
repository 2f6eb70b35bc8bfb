// ABOUTME: Shell command construction with redaction-aware argument values.
// ABOUTME: Builds escaped argument lists, env files, and renderable commands.

mod args;
mod command;
mod env_file;
mod error;
mod escape;
mod value;

pub use args::{Opt, Redaction, argumentize, optionize};
pub use command::Command;
pub use env_file::{EnvSpec, env_file_with_secrets};
pub use error::ShellError;
pub use escape::{escape_shell_value, single_quote};
pub use value::{REDACTED, Sensitive, Value, redacted, sensitive, unredacted};
