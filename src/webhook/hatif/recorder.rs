use serde::Serialize;

use super::schemas::{DeliveryStatus, Direction, HatifStatusUpdate};

/// Acknowledgement returned to Hatif, built only from the update itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub message_id: String,
    pub conversation_event_id: String,
    pub delivery_status: DeliveryStatus,
    pub direction: Direction,
}

impl From<&HatifStatusUpdate> for Ack {
    fn from(update: &HatifStatusUpdate) -> Self {
        Self {
            message_id: update.message_id.clone(),
            conversation_event_id: update.conversation_event_id.clone(),
            delivery_status: update.status,
            direction: update.direction,
        }
    }
}

/// Surfaces delivery status callbacks in the logs.
///
/// Stateless: no transition checks, no storage.
#[derive(Clone, Default)]
pub struct StatusRecorder;

impl StatusRecorder {
    pub fn record(&self, update: &HatifStatusUpdate) -> Ack {
        tracing::info!(
            message_id = %update.message_id,
            status = %update.status,
            conversation_event_id = %update.conversation_event_id,
            contact_id = %update.contact_id,
            channel_id = %update.channel_id,
            direction = %update.direction,
            created_at = %update.created_at,
            error_code = update.error_code.as_deref().unwrap_or_default(),
            error_reason = update.error_reason.as_deref().unwrap_or_default(),
            "hatif_status_recorded"
        );

        Ack::from(update)
    }
}
