//! # Hatif Delivery Status Schemas
//!
//! Hatif calls back with one flat JSON object per WhatsApp message state change.

use chrono::{DateTime, NaiveDateTime, Utc};
use derive_more::Display;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::webhook::{
    errors::DecodeError,
    event::{EventKind, InboundEvent, Source, lookup, required_text, scalar_text},
};

pub const STATUS_UPDATE_EVENT: &str = "HatifStatusUpdate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    /// Exact, case-sensitive match on the literal Hatif sends
    pub fn from_literal(value: &str) -> Option<Self> {
        match value {
            "Inbound" => Some(Direction::Inbound),
            "Outbound" => Some(Direction::Outbound),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum DeliveryStatus {
    Queued,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl DeliveryStatus {
    /// Exact, case-sensitive match on the literal Hatif sends
    pub fn from_literal(value: &str) -> Option<Self> {
        match value {
            "Queued" => Some(DeliveryStatus::Queued),
            "Sent" => Some(DeliveryStatus::Sent),
            "Delivered" => Some(DeliveryStatus::Delivered),
            "Read" => Some(DeliveryStatus::Read),
            "Failed" => Some(DeliveryStatus::Failed),
            _ => None,
        }
    }
}

/// A delivery status callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HatifStatusUpdate {
    pub conversation_event_id: String,
    pub contact_id: String,
    pub channel_id: String,
    pub message_id: String,
    pub direction: Direction,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

/// RFC 3339, or a naive timestamp taken as UTC
pub fn parse_creation_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Decodes a Hatif callback body that already parsed as a JSON object
pub fn decode(payload: Map<String, Value>) -> Result<InboundEvent, DecodeError> {
    let conversation_event_id =
        required_text(&payload, "conversationEventId", &["conversationEventID"])?;
    let contact_id = required_text(&payload, "contactId", &["contactID"])?;
    let channel_id = required_text(&payload, "channelId", &["channelID"])?;
    let message_id = required_text(&payload, "messageId", &["messageID"])?;
    let direction = required_text(&payload, "direction", &[])?;
    let status = required_text(&payload, "status", &[])?;
    let creation_time = required_text(&payload, "creationTime", &["timestamp"])?;

    let direction =
        Direction::from_literal(&direction).ok_or_else(|| DecodeError::invalid_enum("direction"))?;
    let status =
        DeliveryStatus::from_literal(&status).ok_or_else(|| DecodeError::invalid_enum("status"))?;
    let created_at =
        parse_creation_time(&creation_time).ok_or_else(|| DecodeError::invalid("creationTime"))?;

    let update = HatifStatusUpdate {
        error_code: scalar_text(lookup(&payload, &["errorCode"])),
        error_reason: scalar_text(lookup(&payload, &["errorReason"])),
        conversation_event_id: conversation_event_id.clone(),
        contact_id,
        channel_id,
        message_id,
        direction,
        status,
        created_at,
    };

    Ok(InboundEvent {
        source: Source::Hatif,
        id: conversation_event_id,
        event_type: STATUS_UPDATE_EVENT.to_string(),
        payload,
        received_at: Utc::now(),
        kind: EventKind::HatifStatusUpdate(update),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    pub(crate) fn status_payload() -> Value {
        json!({
            "conversationEventId": "conv-1",
            "contactId": "contact-1",
            "channelId": "channel-1",
            "messageId": "wamid.abc",
            "direction": "Outbound",
            "status": "Delivered",
            "creationTime": "2025-06-01T10:15:00Z"
        })
    }

    fn decode_value(value: Value) -> Result<InboundEvent, DecodeError> {
        decode(value.as_object().unwrap().clone())
    }

    #[test]
    fn test_decode_status_update() {
        let event = decode_value(status_payload()).unwrap();

        assert_eq!(event.id, "conv-1");
        assert_eq!(event.event_type, STATUS_UPDATE_EVENT);
        assert_eq!(
            event.kind,
            EventKind::HatifStatusUpdate(HatifStatusUpdate {
                conversation_event_id: "conv-1".into(),
                contact_id: "contact-1".into(),
                channel_id: "channel-1".into(),
                message_id: "wamid.abc".into(),
                direction: Direction::Outbound,
                status: DeliveryStatus::Delivered,
                created_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, 15, 0).unwrap(),
                error_code: None,
                error_reason: None,
            })
        );
    }

    #[test]
    fn test_missing_fields_are_named_in_order() {
        for field in [
            "conversationEventId",
            "contactId",
            "channelId",
            "messageId",
            "direction",
            "status",
            "creationTime",
        ] {
            let mut payload = status_payload();
            payload.as_object_mut().unwrap().remove(field);

            assert_eq!(decode_value(payload), Err(DecodeError::missing(field)));
        }
    }

    #[test]
    fn test_enum_literals_are_case_sensitive() {
        let mut payload = status_payload();
        payload["status"] = json!("delivered");
        assert_eq!(decode_value(payload), Err(DecodeError::invalid_enum("status")));

        let mut payload = status_payload();
        payload["direction"] = json!("OUTBOUND");
        assert_eq!(
            decode_value(payload),
            Err(DecodeError::invalid_enum("direction"))
        );
    }

    #[test]
    fn test_id_aliases_and_error_fields() {
        let payload = json!({
            "conversationEventID": "conv-2",
            "contactID": "contact-2",
            "channelID": "channel-2",
            "messageID": "wamid.def",
            "direction": "Outbound",
            "status": "Failed",
            "timestamp": "2025-06-01T10:15:00",
            "errorCode": 131026,
            "errorReason": "Message undeliverable"
        });

        let EventKind::HatifStatusUpdate(update) = decode_value(payload).unwrap().kind else {
            panic!("expected a status update");
        };
        assert_eq!(update.conversation_event_id, "conv-2");
        assert_eq!(update.status, DeliveryStatus::Failed);
        assert_eq!(update.error_code.as_deref(), Some("131026"));
        assert_eq!(update.error_reason.as_deref(), Some("Message undeliverable"));
        assert_eq!(
            update.created_at,
            Utc.with_ymd_and_hms(2025, 6, 1, 10, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_unparseable_creation_time() {
        let mut payload = status_payload();
        payload["creationTime"] = json!("yesterday");

        assert_eq!(
            decode_value(payload),
            Err(DecodeError::invalid("creationTime"))
        );
    }
}
