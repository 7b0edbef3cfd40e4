use ntex::{
    http::Payload,
    util::Bytes,
    web::{self, ErrorRenderer, types::PayloadConfig},
};

use super::errors::DecodeError;

/// Largest webhook body accepted, Rekaz and Hatif events are a few KiB
pub const MAX_WEBHOOK_BODY_BYTES: usize = 256 * 1024;

/// Payload limit registered on every webhook scope
pub fn payload_config() -> PayloadConfig {
    PayloadConfig::new(MAX_WEBHOOK_BODY_BYTES)
}

/// Raw request body.
///
/// Never fails extraction: a body that cannot be read (too large, broken
/// stream) is kept as a [`DecodeError`] so the handler answers it like any
/// other bad payload, with the request id attached.
pub struct RawBody(Result<Bytes, DecodeError>);

impl RawBody {
    pub fn into_bytes(self) -> Result<Bytes, DecodeError> {
        self.0
    }
}

impl<Err: ErrorRenderer> web::FromRequest<Err> for RawBody {
    type Error = web::Error;

    fn from_request(
        req: &web::HttpRequest,
        payload: &mut Payload,
    ) -> impl std::future::Future<Output = Result<Self, Self::Error>> {
        async move {
            let body = <Bytes as web::FromRequest<Err>>::from_request(req, payload)
                .await
                .map_err(|e| {
                    tracing::warn!(
                        path = %req.path(),
                        error = %e,
                        "webhook_body_unreadable"
                    );
                    DecodeError::MalformedPayload
                });

            Ok(Self(body))
        }
    }
}
