//! Hatif delivery status endpoint

use ntex::web;
use serde::Serialize;

use super::recorder::Ack;
use crate::{
    server::AppState,
    webhook::{
        body::RawBody,
        errors::{DecodeError, WebhookError},
        event::{self, EventKind, Source},
        request_id::RequestId,
    },
};

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    #[serde(flatten)]
    ack: Ack,
}

/// Webhook receiver endpoint (POST)
///
/// Each callback is recorded and acknowledged, an identical retry from Hatif
/// gets an identical answer.
#[web::post("")]
pub async fn receive(
    req: web::HttpRequest,
    body: RawBody,
    request_id: RequestId,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    let outcome = process(&req, body, &request_id, &app_state);
    request_id.respond(&req, outcome)
}

fn process(
    req: &web::HttpRequest,
    body: RawBody,
    request_id: &RequestId,
    app_state: &AppState,
) -> Result<web::HttpResponse, WebhookError> {
    let body = body.into_bytes()?;
    tracing::info!(
        request_id = %request_id,
        body_bytes = body.len(),
        "hatif_webhook_received"
    );

    app_state
        .verifier
        .verify(Source::Hatif, req.headers(), &body)?;
    let event = event::decode(Source::Hatif, &body)?;

    let EventKind::HatifStatusUpdate(update) = event.kind else {
        return Err(DecodeError::MalformedPayload.into());
    };

    let ack = app_state.recorder.record(&update);
    Ok(web::HttpResponse::Ok().json(&StatusResponse { status: "ok", ack }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AppConfig, tests::test_config},
        server::tests::test_state,
        webhook::{
            hatif::security::{SignatureScheme, tests::sign},
            routes,
        },
        whatsapp::MockWhatsAppSender,
    };
    use ntex::{
        http::StatusCode,
        web::{WebResponse, test},
    };
    use serde_json::json;

    const BODY: &str = r#"{"conversationEventId":"conv-1","contactId":"contact-1","channelId":"channel-1","messageId":"wamid.abc","direction":"Outbound","status":"Delivered","creationTime":"2025-06-01T10:15:00Z"}"#;

    fn config_with_secret(secret: &str) -> AppConfig {
        let mut app_config = test_config();
        app_config.hatif_webhook_secret = secret.to_string();
        app_config
    }

    async fn post(app_config: &AppConfig, headers: &[(&str, &str)], body: &'static str) -> WebResponse {
        // status callbacks never send anything
        let mut sender = MockWhatsAppSender::new();
        sender.expect_send().times(0);

        let app = test::init_service(
            web::App::new()
                .state(test_state(app_config, sender))
                .configure(routes::hatif),
        )
        .await;

        let mut req = test::TestRequest::post()
            .uri("/webhooks/hatif/whatsapp")
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        test::call_service(&app, req.set_payload(body).to_request()).await
    }

    async fn json_body(resp: WebResponse) -> serde_json::Value {
        serde_json::from_slice(&test::read_body(resp).await).unwrap()
    }

    fn expected_ack() -> serde_json::Value {
        json!({
            "status": "ok",
            "message_id": "wamid.abc",
            "conversation_event_id": "conv-1",
            "delivery_status": "Delivered",
            "direction": "Outbound"
        })
    }

    #[ntex::test]
    async fn test_unsigned_callback_accepted_without_secret() {
        let resp = post(&test_config(), &[], BODY).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(json_body(resp).await, expected_ack());
    }

    #[ntex::test]
    async fn test_signed_callback_accepted() {
        let app_config = config_with_secret("hatif-secret");
        let signature = sign("hatif-secret", BODY.as_bytes(), SignatureScheme::Hex);

        let resp = post(&app_config, &[("X-Voxa-Signature", signature.as_str())], BODY).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, expected_ack());
    }

    #[ntex::test]
    async fn test_tampered_body_is_rejected() {
        let app_config = config_with_secret("hatif-secret");
        let signature = sign("hatif-secret", BODY.as_bytes(), SignatureScheme::Hex);
        let tampered = r#"{"conversationEventId":"conv-1","contactId":"contact-1","channelId":"channel-1","messageId":"wamid.abc","direction":"Outbound","status":"Read","creationTime":"2025-06-01T10:15:00Z"}"#;

        let resp = post(
            &app_config,
            &[("X-Voxa-Signature", signature.as_str())],
            tampered,
        )
        .await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await, json!({"detail": "bad_signature"}));
    }

    #[ntex::test]
    async fn test_missing_signature_is_rejected() {
        let resp = post(&config_with_secret("hatif-secret"), &[], BODY).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await, json!({"detail": "bad_signature"}));
    }

    #[ntex::test]
    async fn test_duplicate_callbacks_get_identical_answers() {
        let first = post(&test_config(), &[], BODY).await;
        let second = post(&test_config(), &[], BODY).await;

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(json_body(first).await, json_body(second).await);
    }

    #[ntex::test]
    async fn test_invalid_status_is_bad_request() {
        let resp = post(
            &test_config(),
            &[],
            r#"{"conversationEventId":"conv-1","contactId":"contact-1","channelId":"channel-1","messageId":"wamid.abc","direction":"Outbound","status":"delivered","creationTime":"2025-06-01T10:15:00Z"}"#,
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await, json!({"detail": "invalid_enum:status"}));
    }

    #[ntex::test]
    async fn test_missing_message_id_is_bad_request() {
        let resp = post(
            &test_config(),
            &[],
            r#"{"conversationEventId":"conv-1","contactId":"contact-1","channelId":"channel-1","direction":"Outbound","status":"Read","creationTime":"2025-06-01T10:15:00Z"}"#,
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await, json!({"detail": "missing_field:messageId"}));
    }

    #[ntex::test]
    async fn test_oversized_body_is_json_bad_request() {
        let mut sender = MockWhatsAppSender::new();
        sender.expect_send().times(0);

        let app = test::init_service(
            web::App::new()
                .state(test_state(&test_config(), sender))
                .configure(routes::hatif),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/webhooks/hatif/whatsapp")
            .header("X-Request-Id", "req-big")
            .set_payload("a".repeat(300 * 1024))
            .to_request();

        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-big");
        assert_eq!(json_body(resp).await, json!({"detail": "malformed_payload"}));
    }
}
