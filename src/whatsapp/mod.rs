//! Outbound WhatsApp messaging
//!
//! Everything that leaves the process towards WhatsApp goes through this module.
//!
//! ## Submodules
//!
//! - [`dispatcher`] - The only caller of a [`WhatsAppSender`], adds retry and outcome tracking
//! - [`client`] - Hatif (Voxa) service-account API implementation of [`WhatsAppSender`]
//! - [`outgoing_schemas`] - JSON bodies sent to and received from the Hatif API
//! - [`token_cache`] - OAuth client-credentials token cache used by the client

pub mod client;
pub mod dispatcher;
pub mod outgoing_schemas;
pub mod token_cache;

use async_trait::async_trait;
use derive_more::Display;
use serde::Serialize;
use std::str::FromStr;

/// Whether reservation notifications go out as an approved template or as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendMode {
    #[default]
    #[display("template")]
    Template,
    #[display("text")]
    Text,
}

impl FromStr for SendMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "template" => Ok(SendMode::Template),
            "text" => Ok(SendMode::Text),
            other => Err(format!(
                "send mode must be 'template' or 'text', got '{other}'"
            )),
        }
    }
}

/// Body of a WhatsApp message. The variant decides which fields exist, so a
/// request can never carry both template data and free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OutboundMessage {
    Template {
        name: String,
        language: String,
        /// Positional values for the template body placeholders `{{1}}..{{N}}`
        parameters: Vec<String>,
    },
    Text {
        body: String,
    },
}

/// A fully resolved message ready for a [`WhatsAppSender`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhatsAppSendRequest {
    /// Recipient MSISDN as bare digits, no `+`
    pub recipient: String,
    pub message: OutboundMessage,
}

impl WhatsAppSendRequest {
    pub fn mode(&self) -> SendMode {
        match self.message {
            OutboundMessage::Template { .. } => SendMode::Template,
            OutboundMessage::Text { .. } => SendMode::Text,
        }
    }
}

/// What a sender reports back after a single attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOutcome {
    pub success: bool,
    pub external_message_id: Option<String>,
    pub error_code: Option<String>,
    /// `Some(true)` when retrying right away has a fair chance of succeeding
    pub is_transient: Option<bool>,
}

impl SendOutcome {
    pub fn sent(external_message_id: Option<String>) -> Self {
        Self {
            success: true,
            external_message_id,
            ..Default::default()
        }
    }

    pub fn transient_failure(error_code: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: Some(error_code.into()),
            is_transient: Some(true),
            ..Default::default()
        }
    }

    pub fn permanent_failure(error_code: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: Some(error_code.into()),
            is_transient: Some(false),
            ..Default::default()
        }
    }

    /// Failures not explicitly flagged as transient are treated as permanent.
    pub fn is_retryable(&self) -> bool {
        !self.success && self.is_transient.unwrap_or(false)
    }
}

/// External capability that transmits a message to WhatsApp.
///
/// Implementations never return an error: every problem, including transport
/// errors, is folded into the [`SendOutcome`] so the dispatcher can classify it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WhatsAppSender: Send + Sync {
    async fn send(&self, request: &WhatsAppSendRequest) -> SendOutcome;
}

pub type ImplWhatsAppSender = Box<dyn WhatsAppSender>;
