//! Embedded-side reader for injected statements.
//!
//! Accepts exactly what [`encode_command`](super::encoder::encode_command)
//! produces, with optional surrounding whitespace and trailing `;`.

use super::types::{Command, CommandName};
use crate::error::StatementError;

pub fn parse_statement(namespace: &str, script: &str) -> Result<Command, StatementError> {
    let body = script.trim();
    let body = body.strip_suffix(';').unwrap_or(body).trim_end();

    let call = body
        .strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('.'))
        .ok_or_else(|| StatementError::Namespace {
            expected: namespace.to_string(),
        })?;

    let open = call.find('(').ok_or(StatementError::Malformed)?;
    let raw_name = call[..open].trim_end();
    let raw_args = call[open + 1..]
        .strip_suffix(')')
        .ok_or(StatementError::Malformed)?;

    let name = CommandName::from_wire(raw_name)
        .ok_or_else(|| StatementError::UnknownCommand(raw_name.to_string()))?;

    let args: Vec<Option<String>> = serde_json::from_str(&format!("[{raw_args}]"))
        .map_err(|e| StatementError::Arguments(e.to_string()))?;

    if args.len() != name.arity() {
        return Err(StatementError::Arity {
            name: name.as_str(),
            expected: name.arity(),
            got: args.len(),
        });
    }

    Ok(Command::new(name, args))
}
