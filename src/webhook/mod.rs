//! Inbound webhooks: Rekaz reservation events and Hatif delivery callbacks
//!
//! Every request goes through the same stages: authenticate the raw request,
//! decode it into an [`event::InboundEvent`], then hand it to the
//! source-specific handler.

pub mod body;
pub mod errors;
pub mod event;
pub mod hatif;
pub mod rekaz;
pub mod request_id;
pub mod routes;
pub mod security;
