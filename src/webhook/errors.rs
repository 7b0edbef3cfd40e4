use derive_more::{Display, Error};
use ntex::{http, web};
use serde_json::json;

use crate::metric;

/// Why an inbound request was not accepted as authentic.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[display("missing_credentials")]
    MissingCredentials,
    #[display("tenant_mismatch")]
    TenantMismatch,
    #[display("bad_signature")]
    BadSignature,
}

/// Why a payload could not be turned into an event.
///
/// The display form is the reason string returned to the caller, e.g.
/// `missing_field:productName`.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[display("malformed_payload")]
    MalformedPayload,
    #[display("missing_field:{_0}")]
    MissingField(#[error(not(source))] String),
    #[display("invalid_enum:{_0}")]
    InvalidEnum(#[error(not(source))] String),
    #[display("invalid_field:{_0}")]
    InvalidField(#[error(not(source))] String),
}

impl DecodeError {
    pub fn missing(field: &str) -> Self {
        DecodeError::MissingField(field.to_string())
    }

    pub fn invalid_enum(field: &str) -> Self {
        DecodeError::InvalidEnum(field.to_string())
    }

    pub fn invalid(field: &str) -> Self {
        DecodeError::InvalidField(field.to_string())
    }
}

/// Errors surfaced by the webhook endpoints.
#[derive(Debug, Display, Error)]
pub enum WebhookError {
    Unauthorized(AuthFailure),
    BadRequest(DecodeError),
    #[display("dispatch_failed:{_0}")]
    DispatchFailed(#[error(not(source))] String),
    #[display("not_found")]
    UrlNotFound,
}

impl From<AuthFailure> for WebhookError {
    fn from(value: AuthFailure) -> Self {
        WebhookError::Unauthorized(value)
    }
}

impl From<DecodeError> for WebhookError {
    fn from(value: DecodeError) -> Self {
        WebhookError::BadRequest(value)
    }
}

impl web::error::WebResponseError for WebhookError {
    fn error_response(&self, _: &web::HttpRequest) -> web::HttpResponse {
        let detail = self.to_string();

        match self {
            WebhookError::Unauthorized(_) | WebhookError::BadRequest(_) => {
                metric::incr_webhook_rejection_statds(&detail)
            }
            WebhookError::DispatchFailed(_) => metric::incr_webhook_rejection_statds("dispatch_failed"),
            WebhookError::UrlNotFound => {}
        }

        web::HttpResponse::build(self.status_code()).json(&json!({ "detail": detail }))
    }

    fn status_code(&self) -> http::StatusCode {
        match *self {
            WebhookError::Unauthorized(_) => http::StatusCode::UNAUTHORIZED,
            WebhookError::BadRequest(_) => http::StatusCode::BAD_REQUEST,
            WebhookError::DispatchFailed(_) => http::StatusCode::BAD_GATEWAY,
            WebhookError::UrlNotFound => http::StatusCode::NOT_FOUND,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntex::web::error::WebResponseError;

    #[test]
    fn test_reason_strings() {
        assert_eq!(AuthFailure::MissingCredentials.to_string(), "missing_credentials");
        assert_eq!(AuthFailure::TenantMismatch.to_string(), "tenant_mismatch");
        assert_eq!(AuthFailure::BadSignature.to_string(), "bad_signature");
        assert_eq!(DecodeError::MalformedPayload.to_string(), "malformed_payload");
        assert_eq!(DecodeError::missing("number").to_string(), "missing_field:number");
        assert_eq!(DecodeError::invalid_enum("status").to_string(), "invalid_enum:status");
        assert_eq!(
            DecodeError::invalid("startDate").to_string(),
            "invalid_field:startDate"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WebhookError::from(AuthFailure::BadSignature).status_code(),
            http::StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::from(DecodeError::MalformedPayload).status_code(),
            http::StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::DispatchFailed("http_400".into()).status_code(),
            http::StatusCode::BAD_GATEWAY
        );
        assert_eq!(WebhookError::UrlNotFound.status_code(), http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_webhook_error_display_is_the_reason() {
        assert_eq!(
            WebhookError::from(AuthFailure::TenantMismatch).to_string(),
            "tenant_mismatch"
        );
        assert_eq!(
            WebhookError::from(DecodeError::missing("contactId")).to_string(),
            "missing_field:contactId"
        );
    }
}
