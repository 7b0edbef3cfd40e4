//! Application configuration management with security considerations.
//!
//! Every value is read once from the process environment at startup and the
//! resulting [`AppConfig`] is passed by reference into the components that
//! need it. Nothing here is mutated after [`load`] returns.
//!
//! # Security Notes
//! - Sensitive fields are clearly marked and are only ever logged masked
//! - An empty `HATIF_WEBHOOK_SECRET` turns Hatif signature checks off; this is
//!   reported at startup so the operator can see the choice

use anyhow::Context;
use envconfig::Envconfig;
use std::time::Duration;

use crate::{webhook::hatif::security::SignatureScheme, whatsapp::SendMode};

/// Application configuration with security-aware field management.
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// Host address for web server binding (NON-SENSITIVE)
    #[envconfig(default = "0.0.0.0")]
    pub web_server_host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(default = "8000")]
    pub web_server_port: u16,

    /// 🔒 SENSITIVE: Logfire write token, logs stay on the console when empty
    #[envconfig(default = "")]
    pub logfire_token: String,

    /// 🔒 SENSITIVE: token Rekaz sends as `Authorization: Basic <token>`
    pub rekaz_basic_auth: String,

    /// Rekaz tenant expected in the `__tenant` header (NON-SENSITIVE)
    pub rekaz_tenant_id: String,

    /// Hatif (Voxa) API base url (NON-SENSITIVE)
    #[envconfig(default = "https://api.voxa.sa")]
    pub hatif_base_url: String,

    /// Hatif OAuth client id (SEMI-SENSITIVE)
    pub hatif_client_id: String,

    /// 🔒 SENSITIVE: Hatif OAuth client secret
    pub hatif_client_secret: String,

    /// Hatif OAuth scope (NON-SENSITIVE)
    #[envconfig(default = "VoxaAPI")]
    pub hatif_scope: String,

    /// Hatif WhatsApp channel used for every outbound message (NON-SENSITIVE)
    pub hatif_channel_id: String,

    /// 🔒 SENSITIVE: shared secret for Hatif webhook signatures.
    /// Empty means signature verification is skipped.
    #[envconfig(default = "")]
    pub hatif_webhook_secret: String,

    /// Header carrying the Hatif webhook signature (NON-SENSITIVE)
    #[envconfig(default = "X-Voxa-Signature")]
    pub hatif_signature_header: String,

    /// How the Hatif signature is encoded (NON-SENSITIVE)
    /// Values: "hex", "sha256-prefixed", "base64"
    #[envconfig(default = "hex")]
    pub hatif_signature_scheme: SignatureScheme,

    /// Outbound message mode (NON-SENSITIVE)
    /// Values: "template", "text"
    #[envconfig(default = "template")]
    pub hatif_send_mode: SendMode,

    /// WhatsApp template sent for created reservations (NON-SENSITIVE)
    #[envconfig(default = "reservation_created")]
    pub hatif_template_name: String,

    /// Language code of the template (NON-SENSITIVE)
    #[envconfig(default = "ar")]
    pub hatif_template_language: String,

    /// Country code prepended to national mobile numbers (NON-SENSITIVE)
    #[envconfig(default = "966")]
    pub default_country_code: String,

    /// Wait before the single retry of a transient send failure
    #[envconfig(default = "500")]
    pub dispatch_retry_backoff_ms: u64,

    /// Timeout for every request made to the Hatif API
    #[envconfig(default = "15")]
    pub hatif_request_timeout_secs: u64,
}

impl AppConfig {
    pub fn server_addr(&self) -> (String, u16) {
        (self.web_server_host.clone(), self.web_server_port)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.dispatch_retry_backoff_ms)
    }

    pub fn hatif_request_timeout(&self) -> Duration {
        Duration::from_secs(self.hatif_request_timeout_secs)
    }

    /// Rejects values that parse but cannot work at runtime.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rekaz_basic_auth.trim().is_empty() {
            anyhow::bail!("REKAZ_BASIC_AUTH must not be empty");
        }
        if self.rekaz_tenant_id.trim().is_empty() {
            anyhow::bail!("REKAZ_TENANT_ID must not be empty");
        }
        if self.hatif_channel_id.trim().is_empty() {
            anyhow::bail!("HATIF_CHANNEL_ID must not be empty");
        }
        if !self.default_country_code.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!(
                "DEFAULT_COUNTRY_CODE must be digits only, got '{}'",
                self.default_country_code
            );
        }
        if self.hatif_template_name.trim().is_empty() {
            anyhow::bail!("HATIF_TEMPLATE_NAME must not be empty");
        }
        Ok(())
    }

    /// Logs a safe summary of the loaded settings, secrets masked.
    pub fn log_summary(&self) {
        let webhook_secret = if self.hatif_webhook_secret.is_empty() {
            "empty"
        } else {
            "set"
        };

        tracing::info!(
            env = %self.env,
            rekaz_tenant_id = %self.rekaz_tenant_id,
            rekaz_basic_auth = %mask(&self.rekaz_basic_auth),
            hatif_base_url = %self.hatif_base_url,
            hatif_client_id = %self.hatif_client_id,
            hatif_client_secret = %mask(&self.hatif_client_secret),
            hatif_channel_id = %self.hatif_channel_id,
            hatif_webhook_secret = webhook_secret,
            hatif_signature_scheme = %self.hatif_signature_scheme,
            hatif_send_mode = %self.hatif_send_mode,
            hatif_template_name = %self.hatif_template_name,
            "settings_loaded"
        );

        if self.hatif_webhook_secret.is_empty() {
            tracing::warn!("hatif_webhook_signature_check_disabled");
        }
    }
}

/// Keeps the first four characters of a secret, enough to tell two apart.
fn mask(secret: &str) -> String {
    if secret.chars().count() > 4 {
        let prefix: String = secret.chars().take(4).collect();
        return format!("{prefix}****");
    }
    "****".to_string()
}

/// Loads `.env` when present, then reads and validates the environment.
pub fn load() -> anyhow::Result<AppConfig> {
    let _ = dotenvy::dotenv();

    let app_config = AppConfig::init_from_env()
        .context("failed to load configuration from environment variables")?;
    app_config.validate()?;

    Ok(app_config)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn required_vars() -> HashMap<String, String> {
        HashMap::from([
            ("REKAZ_BASIC_AUTH".to_string(), "cmVrYXo6c2VjcmV0".to_string()),
            ("REKAZ_TENANT_ID".to_string(), "tenant-42".to_string()),
            ("HATIF_CLIENT_ID".to_string(), "client".to_string()),
            ("HATIF_CLIENT_SECRET".to_string(), "client-secret".to_string()),
            ("HATIF_CHANNEL_ID".to_string(), "channel-1".to_string()),
        ])
    }

    /// Configuration used across the crate's tests.
    pub(crate) fn test_config() -> AppConfig {
        let mut vars = required_vars();
        vars.insert("DISPATCH_RETRY_BACKOFF_MS".to_string(), "0".to_string());
        AppConfig::init_from_hashmap(&vars).unwrap()
    }

    #[test]
    fn test_defaults_are_applied() {
        let config = AppConfig::init_from_hashmap(&required_vars()).unwrap();

        assert_eq!(config.hatif_send_mode, SendMode::Template);
        assert_eq!(config.hatif_signature_scheme, SignatureScheme::Hex);
        assert_eq!(config.hatif_signature_header, "X-Voxa-Signature");
        assert_eq!(config.hatif_base_url, "https://api.voxa.sa");
        assert!(config.hatif_webhook_secret.is_empty());
        assert_eq!(config.retry_backoff(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_text_send_mode_is_parsed() {
        let mut vars = required_vars();
        vars.insert("HATIF_SEND_MODE".to_string(), "text".to_string());

        let config = AppConfig::init_from_hashmap(&vars).unwrap();
        assert_eq!(config.hatif_send_mode, SendMode::Text);
    }

    #[test]
    fn test_unknown_send_mode_is_rejected() {
        let mut vars = required_vars();
        vars.insert("HATIF_SEND_MODE".to_string(), "sms".to_string());

        assert!(AppConfig::init_from_hashmap(&vars).is_err());
    }

    #[test]
    fn test_missing_required_var_is_rejected() {
        let mut vars = required_vars();
        vars.remove("REKAZ_TENANT_ID");

        assert!(AppConfig::init_from_hashmap(&vars).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_tenant() {
        let mut vars = required_vars();
        vars.insert("REKAZ_TENANT_ID".to_string(), "  ".to_string());

        let config = AppConfig::init_from_hashmap(&vars).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_digit_country_code() {
        let mut vars = required_vars();
        vars.insert("DEFAULT_COUNTRY_CODE".to_string(), "+966".to_string());

        let config = AppConfig::init_from_hashmap(&vars).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mask_hides_secret_tail() {
        assert_eq!(mask("supersecret"), "supe****");
        assert_eq!(mask("abc"), "****");
    }
}
