//! Host-side decoder for messages posted by the embedded document.

use super::types::EditorEvent;
use crate::error::DecodeError;
use serde_json::{Map, Value};

/// Parse one inbound message.
///
/// `Ok(None)` means the message was well formed but carries an event type the
/// host does not handle.
pub fn decode_message(raw: &str) -> Result<Option<EditorEvent>, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| DecodeError::Json(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let kind = map
        .get("event")
        .ok_or(DecodeError::MissingField("event"))?
        .as_str()
        .ok_or(DecodeError::InvalidField("event"))?;

    match kind {
        "documentHeight" => Ok(Some(EditorEvent::DocumentHeight {
            height: height_field(&map)?,
        })),
        "contentChange" => {
            let html = map
                .get("contentChange")
                .ok_or(DecodeError::MissingField("contentChange"))?
                .as_str()
                .ok_or(DecodeError::InvalidField("contentChange"))?;
            Ok(Some(EditorEvent::ContentChange {
                html: html.to_string(),
            }))
        }
        other => {
            tracing::debug!(event = other, "ignoring unknown editor event");
            Ok(None)
        }
    }
}

/// Lossy form of [`decode_message`]: anything that does not decode to a known
/// event is dropped here and never reaches the caller.
pub fn decode_or_drop(raw: &str) -> Option<EditorEvent> {
    match decode_message(raw) {
        Ok(event) => event,
        Err(err) => {
            tracing::debug!(%err, len = raw.len(), "dropping malformed editor message");
            None
        }
    }
}

// Layout engines may report fractional pixels.
fn height_field(map: &Map<String, Value>) -> Result<u32, DecodeError> {
    let height = map
        .get("documentHeight")
        .ok_or(DecodeError::MissingField("documentHeight"))?
        .as_f64()
        .ok_or(DecodeError::InvalidField("documentHeight"))?;

    if !height.is_finite() || height < 0.0 {
        return Err(DecodeError::InvalidField("documentHeight"));
    }
    Ok(height.round().min(f64::from(u32::MAX)) as u32)
}
