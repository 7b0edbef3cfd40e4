//! Rekaz request authentication
//!
//! Rekaz authenticates with a static Basic token and names the tenant in the
//! `__tenant` header. Both must be present and equal to the configured values.

use subtle::ConstantTimeEq;

use crate::webhook::errors::AuthFailure;

pub const TENANT_HEADER: &str = "__tenant";

#[derive(Clone)]
pub struct RekazCredentials {
    basic_token: String,
    tenant_id: String,
}

fn constant_time_eq(left: &str, right: &str) -> bool {
    left.as_bytes().ct_eq(right.as_bytes()).into()
}

impl RekazCredentials {
    pub fn new(basic_token: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            basic_token: basic_token.into(),
            tenant_id: tenant_id.into(),
        }
    }

    /// Checks the `Authorization` and `__tenant` header values.
    ///
    /// A missing header or a token that does not match is reported as
    /// [`AuthFailure::MissingCredentials`]; a well-formed request for another
    /// tenant as [`AuthFailure::TenantMismatch`].
    pub fn verify(
        &self,
        authorization: Option<&str>,
        tenant: Option<&str>,
    ) -> Result<(), AuthFailure> {
        let (Some(authorization), Some(tenant)) = (authorization, tenant) else {
            return Err(AuthFailure::MissingCredentials);
        };

        let token = authorization
            .trim()
            .strip_prefix("Basic ")
            .map(str::trim)
            .ok_or(AuthFailure::MissingCredentials)?;
        if token.is_empty() || !constant_time_eq(token, &self.basic_token) {
            logfire::warn!("Rekaz webhook rejected: basic token does not match");
            return Err(AuthFailure::MissingCredentials);
        }

        if tenant.trim() != self.tenant_id {
            let received = tenant.trim().to_string();
            logfire::warn!(
                "Rekaz webhook rejected: unexpected tenant {received}",
                received = received
            );
            return Err(AuthFailure::TenantMismatch);
        }

        Ok(())
    }
}
