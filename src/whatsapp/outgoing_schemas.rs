//! # Hatif Outgoing Message Schemas
//!
//! Data structures for the Hatif (Voxa) service-account API. Field names follow
//! the PascalCase keys the API expects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Template message sent to `sendTemplate`
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct OutgoingTemplateMessage {
    /// WhatsApp channel configured in Hatif
    pub channel_id: String,
    /// Approved template name
    pub template_name: String,
    /// Template language code (e.g., "ar")
    pub language: String,
    /// Recipient phone number, bare digits
    pub to_number: String,
    /// Template components; omitted when the template takes no parameters
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<TemplateComponent>,
}

impl OutgoingTemplateMessage {
    /// Creates a template message with all values in a single body component
    pub fn new(
        channel_id: String,
        template_name: String,
        language: String,
        to_number: String,
        body_values: &[String],
    ) -> Self {
        let parameters = if body_values.is_empty() {
            vec![]
        } else {
            vec![TemplateComponent {
                component_type: "Body".to_string(),
                values: body_values
                    .iter()
                    .map(|value| TemplateValue {
                        value_type: "text".to_string(),
                        text: value.clone(),
                    })
                    .collect(),
            }]
        };

        Self {
            channel_id,
            template_name,
            language,
            to_number,
            parameters,
        }
    }
}

/// A template component such as the body
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateComponent {
    /// Component type, "Body"
    #[serde(rename = "Type")]
    pub component_type: String,
    /// Positional values for the component placeholders
    pub values: Vec<TemplateValue>,
}

/// A single template placeholder value
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateValue {
    /// Value type, "text"
    #[serde(rename = "Type")]
    pub value_type: String,
    /// The value itself
    pub text: String,
}

/// Free text message sent to `sendText`
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct OutgoingTextMessage {
    pub channel_id: String,
    pub text: String,
    pub to_number: String,
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Send endpoint response.
///
/// Hatif is not consistent about key casing, so keys are lower-cased before
/// the known fields are read.
#[derive(Debug, Default, PartialEq)]
pub struct HatifSendResponse {
    pub conversation_event_id: Option<String>,
    pub contact_id: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
}

impl HatifSendResponse {
    pub fn from_json(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };
        let lowered: Map<String, Value> = object
            .iter()
            .map(|(key, value)| (key.to_lowercase(), value.clone()))
            .collect();
        let text = |key: &str| match lowered.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Self {
            conversation_event_id: text("conversationeventid"),
            contact_id: text("contactid"),
            status: text("status"),
            message: text("message"),
        }
    }
}
