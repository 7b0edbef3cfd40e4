//! # Hatif API Client
//!
//! Sends WhatsApp messages through the Hatif (Voxa) service-account API.
//! Authentication uses the OAuth client-credentials grant; the access token is
//! shared between clones through [`TokenCache`].

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::{sync::Arc, time::Instant};

use super::{
    OutboundMessage, SendOutcome, WhatsAppSendRequest, WhatsAppSender,
    outgoing_schemas::{
        AccessTokenResponse, HatifSendResponse, OutgoingTemplateMessage, OutgoingTextMessage,
    },
    token_cache::TokenCache,
};
use crate::config::AppConfig;

/// Longest slice of a provider error body kept in logs
const MAX_LOGGED_BODY: usize = 1000;

/// Hatif API client
#[derive(Clone)]
pub struct HatifClient {
    /// HTTP client for making API requests
    client: reqwest::Client,
    /// Base url without trailing slash
    base_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    /// WhatsApp channel every message goes out on
    channel_id: String,
    tokens: Arc<TokenCache>,
}

/// Whether a failed HTTP status is worth one immediate retry
pub fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn outcome_for_transport_error(error: &reqwest::Error) -> SendOutcome {
    if error.is_timeout() {
        return SendOutcome::transient_failure("timeout");
    }
    if error.is_builder() {
        return SendOutcome::permanent_failure("invalid_request");
    }
    SendOutcome::transient_failure("network_error")
}

/// Reads the send response body, an unparseable body gives empty fields
fn parse_send_response(content: &str) -> HatifSendResponse {
    serde_json::from_str::<serde_json::Value>(content)
        .map(|value| HatifSendResponse::from_json(&value))
        .unwrap_or_default()
}

/// Maps the HTTP answer of a send call to its outcome
///
/// Any 2xx is a send, with or without a conversation event id.
fn outcome_for_response(status: StatusCode, response: &HatifSendResponse) -> SendOutcome {
    if status.is_success() {
        return SendOutcome::sent(response.conversation_event_id.clone());
    }

    SendOutcome {
        success: false,
        external_message_id: None,
        error_code: Some(format!("http_{}", status.as_u16())),
        is_transient: Some(is_transient_status(status)),
    }
}

/// A rejected bearer token must not be reused
fn drops_cached_token(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED
}

fn outcome_for_token_error(error: &anyhow::Error) -> SendOutcome {
    let transient = match error.downcast_ref::<reqwest::Error>() {
        Some(e) => match e.status() {
            Some(status) => is_transient_status(status),
            None => !e.is_builder() && !e.is_decode(),
        },
        None => false,
    };

    SendOutcome {
        success: false,
        external_message_id: None,
        error_code: Some("token_unavailable".to_string()),
        is_transient: Some(transient),
    }
}

impl HatifClient {
    /// Creates a new Hatif client from the loaded configuration
    pub fn new(app_config: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(app_config.hatif_request_timeout())
            .build()
            .context("failed to build http client for hatif")?;

        Ok(Self {
            client,
            base_url: app_config.hatif_base_url.trim_end_matches('/').to_string(),
            client_id: app_config.hatif_client_id.clone(),
            client_secret: app_config.hatif_client_secret.clone(),
            scope: app_config.hatif_scope.clone(),
            channel_id: app_config.hatif_channel_id.clone(),
            tokens: Arc::new(TokenCache::new()),
        })
    }

    fn token_endpoint(&self) -> String {
        format!("{}/connect/token", self.base_url)
    }

    fn send_endpoint(&self, message: &OutboundMessage) -> String {
        let action = match message {
            OutboundMessage::Template { .. } => "sendTemplate",
            OutboundMessage::Text { .. } => "sendText",
        };
        format!("{}/v1/whatsapp/service-account/{action}", self.base_url)
    }

    /// Requests a new access token with the client-credentials grant
    async fn fetch_token(&self) -> anyhow::Result<(String, u64)> {
        let response = self
            .client
            .post(self.token_endpoint())
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .context("Failed to send token request to Hatif")?
            .error_for_status()?;

        let token: AccessTokenResponse = response
            .json()
            .await
            .context("Failed to parse Hatif token response")?;

        Ok((token.access_token, token.expires_in))
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        self.tokens.get_or_refresh(|| self.fetch_token()).await
    }

    /// Builds the JSON body for the request's message variant
    fn request_body(&self, request: &WhatsAppSendRequest) -> serde_json::Result<serde_json::Value> {
        match &request.message {
            OutboundMessage::Template {
                name,
                language,
                parameters,
            } => serde_json::to_value(OutgoingTemplateMessage::new(
                self.channel_id.clone(),
                name.clone(),
                language.clone(),
                request.recipient.clone(),
                parameters,
            )),
            OutboundMessage::Text { body } => serde_json::to_value(OutgoingTextMessage {
                channel_id: self.channel_id.clone(),
                text: body.clone(),
                to_number: request.recipient.clone(),
            }),
        }
    }
}

#[async_trait]
impl WhatsAppSender for HatifClient {
    async fn send(&self, request: &WhatsAppSendRequest) -> SendOutcome {
        let token = match self.access_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "hatif_token_unavailable");
                return outcome_for_token_error(&e);
            }
        };

        let body = match self.request_body(request) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "hatif_request_body_invalid");
                return SendOutcome::permanent_failure("invalid_request");
            }
        };
        let url = self.send_endpoint(&request.message);

        tracing::info!(
            url = %url,
            to = %request.recipient,
            mode = %request.mode(),
            channel_id = %self.channel_id,
            "hatif_send_request"
        );

        let started = Instant::now();
        let response = match self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(to = %request.recipient, error = %e, "hatif_send_transport_error");
                return outcome_for_transport_error(&e);
            }
        };

        let status = response.status();
        let content = response.text().await.unwrap_or_default();
        let parsed = parse_send_response(&content);
        let duration_ms = started.elapsed().as_millis() as u64;
        let outcome = outcome_for_response(status, &parsed);

        if outcome.success {
            tracing::info!(
                to = %request.recipient,
                status_code = status.as_u16(),
                duration_ms = duration_ms,
                conversation_event_id = parsed.conversation_event_id.as_deref().unwrap_or_default(),
                contact_id = parsed.contact_id.as_deref().unwrap_or_default(),
                "hatif_send_success"
            );
            return outcome;
        }

        if drops_cached_token(status) {
            self.tokens.invalidate().await;
        }

        let logged_body: String = content.chars().take(MAX_LOGGED_BODY).collect();
        tracing::error!(
            to = %request.recipient,
            status_code = status.as_u16(),
            duration_ms = duration_ms,
            response_body = %logged_body,
            provider_message = parsed.message.as_deref().unwrap_or_default(),
            "hatif_send_failed"
        );

        outcome
    }
}
