//! # Outbound Dispatcher
//!
//! Sends a [`WhatsAppSendRequest`] through the configured [`WhatsAppSender`],
//! retrying once after a fixed backoff when the first failure is transient.

use ntex::time::{Millis, sleep};
use serde::Serialize;
use std::time::Duration;

use super::{ImplWhatsAppSender, SendOutcome, WhatsAppSendRequest};
use crate::metric;

/// Two attempts at most: the first call plus one retry.
pub const MAX_ATTEMPTS: u8 = 2;

/// Final outcome of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchResult {
    Sent {
        external_message_id: Option<String>,
        attempts: u8,
    },
    Failed {
        error: String,
        attempts: u8,
        transient: bool,
    },
}

impl DispatchResult {
    pub fn attempts(&self) -> u8 {
        match self {
            DispatchResult::Sent { attempts, .. } | DispatchResult::Failed { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchResult::Sent { .. })
    }

    fn from_outcome(outcome: SendOutcome, attempts: u8) -> Self {
        if outcome.success {
            return DispatchResult::Sent {
                external_message_id: outcome.external_message_id,
                attempts,
            };
        }

        DispatchResult::Failed {
            transient: outcome.is_retryable(),
            error: outcome
                .error_code
                .unwrap_or_else(|| "unknown_error".to_string()),
            attempts,
        }
    }
}

pub struct Dispatcher {
    sender: ImplWhatsAppSender,
    retry_backoff: Duration,
}

impl Dispatcher {
    pub fn new(sender: ImplWhatsAppSender, retry_backoff: Duration) -> Self {
        Self {
            sender,
            retry_backoff,
        }
    }

    /// Sends the request, retrying a single transient failure.
    ///
    /// The backoff only suspends the calling request.
    pub async fn dispatch(&self, request: &WhatsAppSendRequest) -> DispatchResult {
        let mut attempt: u8 = 1;
        let mut outcome = self.sender.send(request).await;

        while outcome.is_retryable() && attempt < MAX_ATTEMPTS {
            tracing::warn!(
                recipient = %request.recipient,
                attempt = attempt,
                error_code = outcome.error_code.as_deref().unwrap_or_default(),
                backoff_ms = self.retry_backoff.as_millis() as u64,
                "dispatch_retrying"
            );
            sleep(Millis::from(self.retry_backoff)).await;

            attempt += 1;
            outcome = self.sender.send(request).await;
        }

        let result = DispatchResult::from_outcome(outcome, attempt);
        match &result {
            DispatchResult::Sent {
                external_message_id,
                attempts,
            } => {
                metric::incr_dispatch_outcome_statds("sent");
                tracing::info!(
                    recipient = %request.recipient,
                    mode = %request.mode(),
                    attempts = *attempts,
                    external_message_id = external_message_id.as_deref().unwrap_or_default(),
                    "dispatch_sent"
                );
            }
            DispatchResult::Failed {
                error,
                attempts,
                transient,
            } => {
                metric::incr_dispatch_outcome_statds(if *transient {
                    "failed_transient"
                } else {
                    "failed_permanent"
                });
                tracing::error!(
                    recipient = %request.recipient,
                    mode = %request.mode(),
                    attempts = *attempts,
                    transient = *transient,
                    error = %error,
                    "dispatch_failed"
                );
            }
        }

        result
    }
}
