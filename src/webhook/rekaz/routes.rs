//! Rekaz webhook endpoint
//!
//! Rekaz posts reservation lifecycle events here. `ReservationCreatedEvent`
//! is turned into a WhatsApp notification for the customer and the response
//! is only returned once the dispatch has resolved. Any other event name is
//! acknowledged without sending anything.

use ntex::web;
use serde_json::json;

use super::schemas::ReservationCreated;
use crate::{
    server::AppState,
    webhook::{
        body::RawBody,
        errors::WebhookError,
        event::{self, EventKind, Source},
        request_id::RequestId,
    },
    whatsapp::dispatcher::DispatchResult,
};

/// Webhook receiver endpoint (POST)
#[web::post("")]
pub async fn receive(
    req: web::HttpRequest,
    body: RawBody,
    request_id: RequestId,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    let outcome = process(&req, body, &request_id, &app_state).await;
    request_id.respond(&req, outcome)
}

async fn process(
    req: &web::HttpRequest,
    body: RawBody,
    request_id: &RequestId,
    app_state: &AppState,
) -> Result<web::HttpResponse, WebhookError> {
    let body = body.into_bytes()?;
    tracing::info!(
        request_id = %request_id,
        body_bytes = body.len(),
        "rekaz_webhook_received"
    );

    app_state
        .verifier
        .verify(Source::Rekaz, req.headers(), &body)?;
    let event = event::decode(Source::Rekaz, &body)?;

    let reservation = match event.kind {
        EventKind::ReservationCreated(reservation) => reservation,
        _ => {
            tracing::info!(
                request_id = %request_id,
                event_id = %event.id,
                event_name = %event.event_type,
                "rekaz_event_ignored"
            );
            return Ok(web::HttpResponse::Ok().json(&json!({
                "status": "ignored",
                "event_name": event.event_type,
            })));
        }
    };

    tracing::info!(
        request_id = %request_id,
        event_id = %event.id,
        reservation_number = %reservation.reservation_number,
        "rekaz_reservation_created"
    );

    notify_customer(&reservation, request_id, app_state).await
}

async fn notify_customer(
    reservation: &ReservationCreated,
    request_id: &RequestId,
    app_state: &AppState,
) -> Result<web::HttpResponse, WebhookError> {
    let request = app_state
        .translator
        .translate(reservation, app_state.send_mode);

    match app_state.dispatcher.dispatch(&request).await {
        DispatchResult::Sent {
            external_message_id,
            attempts,
        } => Ok(web::HttpResponse::Ok().json(&json!({
            "status": "sent",
            "attempts": attempts,
            "message_id": external_message_id,
        }))),
        DispatchResult::Failed {
            error, attempts, ..
        } => {
            tracing::error!(
                request_id = %request_id,
                reservation_number = %reservation.reservation_number,
                attempts = attempts,
                error = %error,
                "rekaz_notification_failed"
            );
            Err(WebhookError::DispatchFailed(error))
        }
    }
}
