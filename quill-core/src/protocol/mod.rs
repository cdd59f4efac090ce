//! The command/event wire protocol shared by both halves of the bridge.
//!
//! - host -> embedded: [`encoder`] writes statements, [`statement`] reads them.
//! - embedded -> host: [`EditorEvent::to_message`] writes, [`decoder`] reads.

pub mod decoder;
pub mod encoder;
pub mod statement;
pub mod types;

pub use decoder::{decode_message, decode_or_drop};
pub use encoder::{CommandEncoder, DEFAULT_NAMESPACE, encode_command, is_valid_namespace};
pub use statement::parse_statement;
pub use types::{Command, CommandName, EditorEvent};
