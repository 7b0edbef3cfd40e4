//! Application state and handlers not linked to a webhook source

use ntex::web;

use crate::{
    config::AppConfig,
    webhook::{
        errors::WebhookError, hatif::recorder::StatusRecorder, rekaz::translator::Translator,
        request_id::RequestId, security::SignatureVerifier,
    },
    whatsapp::{ImplWhatsAppSender, SendMode, dispatcher::Dispatcher},
};

/// Per-worker state shared by every handler.
///
/// Built once from the loaded configuration, never mutated afterwards.
pub struct AppState {
    pub verifier: SignatureVerifier,
    pub translator: Translator,
    pub dispatcher: Dispatcher,
    pub recorder: StatusRecorder,
    pub send_mode: SendMode,
}

impl AppState {
    pub fn new(app_config: &AppConfig, sender: ImplWhatsAppSender) -> Self {
        Self {
            verifier: SignatureVerifier::from_config(app_config),
            translator: Translator::from_config(app_config),
            dispatcher: Dispatcher::new(sender, app_config.retry_backoff()),
            recorder: StatusRecorder,
            send_mode: app_config.hatif_send_mode,
        }
    }
}

/// Liveness check
#[web::get("/health")]
pub async fn health(request_id: RequestId) -> web::HttpResponse {
    request_id.attach(
        web::HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body("OK"),
    )
}

/// Return a [UrlNotFound](WebhookError::UrlNotFound) error for urls not defined
pub async fn serve_not_found(req: web::HttpRequest) -> web::HttpResponse {
    RequestId::from_http_request(&req).respond(&req, Err(WebhookError::UrlNotFound))
}
