//! Host-side command encoder.
//!
//! Produces statements of the form `<namespace>.<name>(<args>);` where every
//! argument is a JSON literal. JSON string literals are lossless for any
//! content the host hands over (quotes, backslashes, newlines, markup), which
//! plain interpolation into a quoted script literal is not.

use super::types::Command;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Object the embedded runtime is published under.
pub const DEFAULT_NAMESPACE: &str = "window.quillEditor";

/// Encodes commands for one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEncoder {
    namespace: String,
}

impl Default for CommandEncoder {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl CommandEncoder {
    /// Falls back to [`DEFAULT_NAMESPACE`] when `namespace` is not a dotted
    /// identifier path.
    pub fn new(namespace: &str) -> Self {
        if is_valid_namespace(namespace) {
            Self {
                namespace: namespace.to_string(),
            }
        } else {
            tracing::warn!(namespace, "invalid command namespace, using default");
            Self::default()
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn encode(&self, command: &Command) -> String {
        encode_command(&self.namespace, command)
    }
}

/// Serialize `command` into one executable statement.
pub fn encode_command(namespace: &str, command: &Command) -> String {
    let mut out = String::with_capacity(
        namespace.len() + 32 + command.args.iter().flatten().map(String::len).sum::<usize>(),
    );
    out.push_str(namespace);
    out.push('.');
    out.push_str(command.name.as_str());
    out.push('(');
    for (i, arg) in command.args.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&encode_arg(arg.as_deref()));
    }
    out.push_str(");");
    out
}

fn encode_arg(arg: Option<&str>) -> String {
    match arg {
        None => "null".to_string(),
        Some(s) => {
            let literal = Value::String(s.to_owned()).to_string();
            // JSON permits raw line/paragraph separators; older script parsers do not.
            if literal.contains(['\u{2028}', '\u{2029}']) {
                literal.replace('\u{2028}', "\\u2028").replace('\u{2029}', "\\u2029")
            } else {
                literal
            }
        }
    }
}

static NAMESPACE_REGEX: OnceLock<Regex> = OnceLock::new();

/// A namespace is a dotted path of script identifiers, e.g. `window.editor`.
pub fn is_valid_namespace(namespace: &str) -> bool {
    NAMESPACE_REGEX
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
                .expect("Invalid namespace Regex")
        })
        .is_match(namespace)
}
