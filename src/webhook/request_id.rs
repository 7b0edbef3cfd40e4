use derive_more::Display;
use ntex::{
    http::{
        Payload,
        header::{HeaderName, HeaderValue},
    },
    web,
};

use super::errors::WebhookError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller supplied id that is echoed back
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation id of the current request.
///
/// Taken from the `X-Request-Id` header when the caller sends a usable one,
/// otherwise a fresh UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub struct RequestId(String);

impl RequestId {
    pub fn from_http_request(req: &web::HttpRequest) -> Self {
        req.headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| is_usable(id))
            .map(|id| Self(id.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sets the `X-Request-Id` header on an outgoing response
    pub fn attach(&self, mut response: web::HttpResponse) -> web::HttpResponse {
        if let Ok(value) = HeaderValue::from_str(&self.0) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        response
    }

    /// Renders a handler outcome, errors included, with the id attached
    pub fn respond(
        &self,
        req: &web::HttpRequest,
        outcome: Result<web::HttpResponse, WebhookError>,
    ) -> web::HttpResponse {
        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                let response = web::error::WebResponseError::error_response(&error, req);
                tracing::warn!(
                    request_id = %self,
                    path = %req.path(),
                    status_code = response.status().as_u16(),
                    detail = %error,
                    "webhook_request_rejected"
                );
                response
            }
        };
        self.attach(response)
    }
}

fn is_usable(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.chars().all(|c| c.is_ascii_graphic())
}

impl<Err> web::FromRequest<Err> for RequestId {
    type Error = web::Error;

    fn from_request(
        req: &web::HttpRequest,
        _: &mut Payload,
    ) -> impl std::future::Future<Output = Result<Self, Self::Error>> {
        std::future::ready(Ok(Self::from_http_request(req)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntex::web::test::TestRequest;

    #[test]
    fn test_echoes_caller_request_id() {
        let req = TestRequest::default()
            .header("X-Request-Id", "abc-123")
            .to_http_request();

        assert_eq!(RequestId::from_http_request(&req).as_str(), "abc-123");
    }

    #[test]
    fn test_generates_uuid_when_missing_or_unusable() {
        let missing = TestRequest::default().to_http_request();
        let blank = TestRequest::default()
            .header("X-Request-Id", "   ")
            .to_http_request();
        let too_long = TestRequest::default()
            .header("X-Request-Id", "a".repeat(200))
            .to_http_request();

        for req in [missing, blank, too_long] {
            let id = RequestId::from_http_request(&req);
            assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
        }
    }

    #[test]
    fn test_attach_sets_header() {
        let response = RequestId("abc-123".into()).attach(web::HttpResponse::Ok().finish());

        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "abc-123"
        );
    }

    #[test]
    fn test_respond_renders_errors_with_header() {
        let req = TestRequest::default().to_http_request();
        let response = RequestId("abc-123".into())
            .respond(&req, Err(WebhookError::UrlNotFound));

        assert_eq!(response.status(), ntex::http::StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "abc-123"
        );
    }
}
