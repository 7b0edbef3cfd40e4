//! # Reservation → WhatsApp translation
//!
//! Turns a [`ReservationCreated`] event into a [`WhatsAppSendRequest`].
//! Pure and deterministic: the same event and mode always give the same request.

use super::schemas::{ReservationCreated, msisdn_digits};
use crate::{
    config::AppConfig,
    whatsapp::{OutboundMessage, SendMode, WhatsAppSendRequest},
};

/// Name used when Rekaz does not send one
pub const GUEST_NAME: &str = "Guest";

const START_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct Translator {
    template_name: String,
    template_language: String,
    default_country_code: String,
}

impl Translator {
    pub fn new(
        template_name: impl Into<String>,
        template_language: impl Into<String>,
        default_country_code: impl Into<String>,
    ) -> Self {
        Self {
            template_name: template_name.into(),
            template_language: template_language.into(),
            default_country_code: default_country_code.into(),
        }
    }

    pub fn from_config(app_config: &AppConfig) -> Self {
        Self::new(
            app_config.hatif_template_name.clone(),
            app_config.hatif_template_language.clone(),
            app_config.default_country_code.clone(),
        )
    }

    /// Normalizes a mobile number to bare international digits.
    ///
    /// Drops a leading `+` or `00`, and expands Saudi-style national numbers
    /// (`05XXXXXXXX`, `5XXXXXXXX`) with the default country code.
    pub fn normalize_recipient(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let mut digits = msisdn_digits(trimmed).unwrap_or_else(|| {
            trimmed.chars().filter(char::is_ascii_digit).collect()
        });

        if digits.len() == 10 && digits.starts_with('0') {
            digits = format!("{}{}", self.default_country_code, &digits[1..]);
        } else if digits.len() == 9 && digits.starts_with('5') {
            digits = format!("{}{}", self.default_country_code, digits);
        }

        digits
    }

    /// Ordered template values: name, reservation number, product, start date
    pub fn template_parameters(event: &ReservationCreated) -> Vec<String> {
        vec![
            event
                .customer_name
                .clone()
                .unwrap_or_else(|| GUEST_NAME.to_string()),
            event.reservation_number.clone(),
            event.product_name.clone(),
            event.start_date.format(START_DATE_FORMAT).to_string(),
        ]
    }

    /// The free-text form of the same four values
    pub fn text_body(event: &ReservationCreated) -> String {
        format!(
            "Hello {name}, your reservation {number} for {product} on {date} has been created.",
            name = event.customer_name.as_deref().unwrap_or(GUEST_NAME),
            number = event.reservation_number,
            product = event.product_name,
            date = event.start_date.format(START_DATE_FORMAT),
        )
    }

    pub fn translate(&self, event: &ReservationCreated, mode: SendMode) -> WhatsAppSendRequest {
        let message = match mode {
            SendMode::Template => OutboundMessage::Template {
                name: self.template_name.clone(),
                language: self.template_language.clone(),
                parameters: Self::template_parameters(event),
            },
            SendMode::Text => OutboundMessage::Text {
                body: Self::text_body(event),
            },
        };

        WhatsAppSendRequest {
            recipient: self.normalize_recipient(&event.mobile_number),
            message,
        }
    }
}
