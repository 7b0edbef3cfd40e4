//! Typed inbound events shared by both webhook sources
//!
//! [`decode`] is the single entry point: it picks the source-specific decoder
//! and wraps the result in an [`InboundEvent`] envelope.

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde_json::{Map, Value};

use super::{errors::DecodeError, hatif, rekaz};

/// Which platform sent the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Source {
    #[display("rekaz")]
    Rekaz,
    #[display("hatif")]
    Hatif,
}

/// Decoded payload variants
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    ReservationCreated(rekaz::schemas::ReservationCreated),
    HatifStatusUpdate(hatif::schemas::HatifStatusUpdate),
    /// Well formed but not handled, kept so the caller can acknowledge it
    Unrecognized,
}

/// A decoded webhook event.
///
/// `id` is never empty and `event_type` is always set, including for
/// [`EventKind::Unrecognized`].
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub source: Source,
    pub id: String,
    pub event_type: String,
    pub payload: Map<String, Value>,
    pub received_at: DateTime<Utc>,
    pub kind: EventKind,
}

/// Parses a raw request body into an [`InboundEvent`]
pub fn decode(source: Source, raw_body: &[u8]) -> Result<InboundEvent, DecodeError> {
    let payload = parse_object(raw_body)?;
    match source {
        Source::Rekaz => rekaz::schemas::decode(payload),
        Source::Hatif => hatif::schemas::decode(payload),
    }
}

/// The body must be a JSON object, anything else is malformed
pub(crate) fn parse_object(raw_body: &[u8]) -> Result<Map<String, Value>, DecodeError> {
    match serde_json::from_slice::<Value>(raw_body) {
        Ok(Value::Object(object)) => Ok(object),
        _ => Err(DecodeError::MalformedPayload),
    }
}

/// Looks a field up under its canonical name, then under its aliases
pub(crate) fn lookup<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| object.get(*name))
}

/// Reads a scalar as text. Strings are trimmed, numbers rendered as written,
/// null, blank strings and structured values count as absent.
pub(crate) fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A required text field: present, non-null, non-blank
pub(crate) fn required_text(
    object: &Map<String, Value>,
    field: &str,
    aliases: &[&str],
) -> Result<String, DecodeError> {
    let mut names = vec![field];
    names.extend_from_slice(aliases);
    scalar_text(lookup(object, &names)).ok_or_else(|| DecodeError::missing(field))
}
