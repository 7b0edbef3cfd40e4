//! Hatif callback signature verification
//!
//! Hatif signs the raw callback body with HMAC-SHA256 using the shared webhook
//! secret and sends the digest in a header (`X-Voxa-Signature` by default).
//! The digest encoding differs between Hatif accounts, so it is configurable:
//!
//! - `hex`: lowercase or uppercase hex digest
//! - `sha256-prefixed`: `sha256=<hex digest>`
//! - `base64`: standard base64 digest
//!
//! The digest is always computed over the raw body bytes, never re-serialized JSON.

use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use derive_more::Display;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::webhook::errors::AuthFailure;

type HmacSha256 = Hmac<Sha256>;

/// How the digest is written in the signature header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Default)]
pub enum SignatureScheme {
    #[default]
    #[display("hex")]
    Hex,
    #[display("sha256-prefixed")]
    Sha256Prefixed,
    #[display("base64")]
    Base64,
}

impl FromStr for SignatureScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hex" => Ok(SignatureScheme::Hex),
            "sha256-prefixed" | "sha256" => Ok(SignatureScheme::Sha256Prefixed),
            "base64" => Ok(SignatureScheme::Base64),
            other => Err(format!("unknown signature scheme: {other}")),
        }
    }
}

impl SignatureScheme {
    /// Decodes a header value into raw digest bytes, `None` when it is not
    /// written in this scheme
    fn decode_digest(&self, header_value: &str) -> Option<Vec<u8>> {
        let value = header_value.trim();
        match self {
            SignatureScheme::Hex => hex::decode(value).ok(),
            SignatureScheme::Sha256Prefixed => value
                .strip_prefix("sha256=")
                .and_then(|digest| hex::decode(digest).ok()),
            SignatureScheme::Base64 => STANDARD.decode(value).ok(),
        }
    }

    /// Writes a digest the way Hatif would send it
    pub fn encode_digest(&self, digest: &[u8]) -> String {
        match self {
            SignatureScheme::Hex => hex::encode(digest),
            SignatureScheme::Sha256Prefixed => format!("sha256={}", hex::encode(digest)),
            SignatureScheme::Base64 => STANDARD.encode(digest),
        }
    }
}

/// Computes HMAC-SHA256 of `payload` keyed with `secret`
pub fn compute_digest(secret: &str, payload: &[u8]) -> Result<Vec<u8>, AuthFailure> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| {
        logfire::error!(
            "Failed to create HMAC instance: {error}",
            error = e.to_string()
        );
        AuthFailure::BadSignature
    })?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Shared-secret policy for Hatif callbacks.
///
/// An empty secret turns verification off and every callback is accepted.
#[derive(Clone)]
pub struct HatifSignaturePolicy {
    secret: String,
    header: String,
    scheme: SignatureScheme,
}

impl HatifSignaturePolicy {
    pub fn new(
        secret: impl Into<String>,
        header: impl Into<String>,
        scheme: SignatureScheme,
    ) -> Self {
        Self {
            secret: secret.into(),
            header: header.into().trim().to_ascii_lowercase(),
            scheme,
        }
    }

    /// Lowercased header name carrying the signature
    pub fn header_name(&self) -> &str {
        &self.header
    }

    pub fn is_enabled(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Verifies the signature header value against the raw body
    pub fn verify(&self, signature: Option<&str>, payload: &[u8]) -> Result<(), AuthFailure> {
        if !self.is_enabled() {
            return Ok(());
        }

        let Some(signature) = signature else {
            logfire::warn!("Hatif webhook rejected: signature header is missing");
            return Err(AuthFailure::BadSignature);
        };

        let Some(received) = self.scheme.decode_digest(signature) else {
            let scheme = self.scheme.to_string();
            logfire::warn!(
                "Hatif webhook rejected: signature is not {scheme} encoded",
                scheme = scheme
            );
            return Err(AuthFailure::BadSignature);
        };

        let computed = compute_digest(&self.secret, payload)?;
        let is_valid: bool = computed.ct_eq(&received[..]).into();

        if !is_valid {
            logfire::warn!("Hatif webhook rejected: signatures do not match");
            return Err(AuthFailure::BadSignature);
        }

        Ok(())
    }
}
