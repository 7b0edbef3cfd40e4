//! # Rekaz Webhook Schemas
//!
//! Rekaz posts every event as `{"Id": ..., "EventName": ..., "Data": {...}}`.
//! Only `ReservationCreatedEvent` has a typed `Data` block here, every other
//! event name decodes to [`EventKind::Unrecognized`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::webhook::{
    errors::DecodeError,
    event::{EventKind, InboundEvent, Source, lookup, required_text, scalar_text},
};

pub const RESERVATION_CREATED_EVENT: &str = "ReservationCreatedEvent";

/// Shortest and longest digit count accepted as a mobile number
const MSISDN_MIN_DIGITS: usize = 8;
const MSISDN_MAX_DIGITS: usize = 15;

/// Payload of a `ReservationCreatedEvent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationCreated {
    /// Customer mobile number as sent by Rekaz, already checked to be an MSISDN
    pub mobile_number: String,
    pub customer_name: Option<String>,
    pub reservation_number: String,
    pub product_name: String,
    pub start_date: NaiveDate,
}

/// Strips the characters people type around phone numbers, and the `+` or
/// `00` international prefix.
///
/// Returns `None` unless what is left is 8 to 15 digits.
pub fn msisdn_digits(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let without_plus = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = without_plus
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();
    let digits = match digits.strip_prefix("00") {
        Some(rest) if without_plus.len() == trimmed.len() => rest.to_string(),
        _ => digits,
    };

    let valid = digits.chars().all(|c| c.is_ascii_digit())
        && (MSISDN_MIN_DIGITS..=MSISDN_MAX_DIGITS).contains(&digits.len());
    valid.then_some(digits)
}

/// Accepts `YYYY-MM-DD`, RFC 3339 date-times and naive date-times, keeps the date
pub fn parse_start_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|datetime| datetime.date())
}

fn decode_reservation_created(data: &Map<String, Value>) -> Result<ReservationCreated, DecodeError> {
    let customer = lookup(data, &["customer", "Customer"]).and_then(Value::as_object);

    let mobile_raw = customer
        .and_then(|customer| {
            scalar_text(lookup(customer, &["MobileNumber", "mobileNumber"]))
        })
        .ok_or_else(|| DecodeError::missing("customer.MobileNumber"))?;
    let reservation_number = required_text(data, "number", &["Number"])?;
    let product_name = required_text(data, "productName", &["ProductName"])?;
    let start_date_raw = required_text(data, "startDate", &["StartDate"])?;

    let customer_name =
        customer.and_then(|customer| scalar_text(lookup(customer, &["name", "Name"])));

    if msisdn_digits(&mobile_raw).is_none() {
        return Err(DecodeError::invalid("customer.MobileNumber"));
    }
    let start_date =
        parse_start_date(&start_date_raw).ok_or_else(|| DecodeError::invalid("startDate"))?;

    Ok(ReservationCreated {
        mobile_number: mobile_raw,
        customer_name,
        reservation_number,
        product_name,
        start_date,
    })
}

/// Decodes a Rekaz webhook body that already parsed as a JSON object
pub fn decode(payload: Map<String, Value>) -> Result<InboundEvent, DecodeError> {
    let id = scalar_text(lookup(&payload, &["Id", "id"])).ok_or(DecodeError::MalformedPayload)?;
    let event_name = scalar_text(lookup(&payload, &["EventName", "eventName"]))
        .ok_or(DecodeError::MalformedPayload)?;
    let data = lookup(&payload, &["Data", "data"])
        .and_then(Value::as_object)
        .ok_or(DecodeError::MalformedPayload)?;

    let kind = if event_name == RESERVATION_CREATED_EVENT {
        EventKind::ReservationCreated(decode_reservation_created(data)?)
    } else {
        EventKind::Unrecognized
    };

    Ok(InboundEvent {
        source: Source::Rekaz,
        id,
        event_type: event_name,
        payload,
        received_at: Utc::now(),
        kind,
    })
}
