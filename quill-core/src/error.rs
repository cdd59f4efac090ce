//! Error types for the wire protocol and the embedded document model.
//!
//! None of these ever cross the bridge: the host-facing command API has no
//! return path, so every error here ends its life in a `tracing` line.

use crate::dom::NodeId;
use thiserror::Error;

/// Why an inbound event message was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed event JSON: {0}")]
    Json(String),

    #[error("event payload is not a JSON object")]
    NotAnObject,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for field: {0}")]
    InvalidField(&'static str),
}

/// Why an injected statement was rejected by the embedded runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    #[error("statement is not of the form <namespace>.<name>(<args>)")]
    Malformed,

    #[error("statement is not addressed to namespace `{expected}`")]
    Namespace { expected: String },

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("invalid argument list: {0}")]
    Arguments(String),

    #[error("command `{name}` takes {expected} argument(s), got {got}")]
    Arity {
        name: &'static str,
        expected: usize,
        got: usize,
    },
}

/// Tree and range violations inside the embedded document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0:?} does not exist in this document")]
    UnknownNode(NodeId),

    #[error("offset {offset} is out of bounds for node {node:?}")]
    IndexSize { node: NodeId, offset: usize },

    #[error("range partially selects a non-text node")]
    PartiallySelected,

    #[error("`{0}` is not a valid element name")]
    InvalidTagName(String),

    #[error("node {0:?} cannot be inserted here")]
    HierarchyRequest(NodeId),

    #[error("range {0:?} has been released")]
    UnknownRange(usize),

    #[error("document has no element with id `{0}`")]
    MissingRoot(String),
}
