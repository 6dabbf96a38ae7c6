use mongodb::bson::DateTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod admin;
pub mod health;
pub mod public;
pub mod validation;

/// Render a stored timestamp as RFC3339 for API responses.
pub(crate) fn format_timestamp(timestamp: DateTime) -> String {
    OffsetDateTime::from(timestamp.to_system_time())
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an RFC3339 timestamp from a request into the stored representation.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .map(|parsed| DateTime::from_system_time(parsed.into()))
}
