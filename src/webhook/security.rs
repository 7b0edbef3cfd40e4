//! Per-source request authentication

use ntex::http::HeaderMap;
use std::borrow::Cow;

use super::{
    errors::AuthFailure,
    event::Source,
    hatif::security::HatifSignaturePolicy,
    rekaz::security::{RekazCredentials, TENANT_HEADER},
};
use crate::config::AppConfig;

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Header value as text even when it holds bytes outside visible ASCII
fn header_lossy<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
}

/// Decides whether an inbound request is authentic for its source
#[derive(Clone)]
pub struct SignatureVerifier {
    rekaz: RekazCredentials,
    hatif: HatifSignaturePolicy,
}

impl SignatureVerifier {
    pub fn new(rekaz: RekazCredentials, hatif: HatifSignaturePolicy) -> Self {
        Self { rekaz, hatif }
    }

    pub fn from_config(app_config: &AppConfig) -> Self {
        Self::new(
            RekazCredentials::new(
                app_config.rekaz_basic_auth.clone(),
                app_config.rekaz_tenant_id.clone(),
            ),
            HatifSignaturePolicy::new(
                app_config.hatif_webhook_secret.clone(),
                app_config.hatif_signature_header.clone(),
                app_config.hatif_signature_scheme,
            ),
        )
    }

    /// Checks headers and raw body, must run before the body is decoded
    pub fn verify(&self, source: Source, headers: &HeaderMap, body: &[u8]) -> Result<(), AuthFailure> {
        match source {
            Source::Rekaz => self.rekaz.verify(
                header_text(headers, "authorization"),
                header_lossy(headers, TENANT_HEADER).as_deref(),
            ),
            Source::Hatif => self
                .hatif
                .verify(header_text(headers, self.hatif.header_name()), body),
        }
    }
}
