use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared_types::RawMessage;
use tracing::warn;

/// What to emit when a message's Date header cannot be parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderDateFallback {
    /// Today's date
    #[default]
    Now,
    /// An empty string, which sorts last on export
    Empty,
}

/// Parses "Sun, 29 Nov 2020 21:32:07 +0000 (UTC)". Only day, month and year
/// are read, positionally.
pub fn parse_header_date(raw: &str) -> Option<NaiveDate> {
    let without_zone = raw.trim().trim_end_matches("(UTC)").trim();
    let without_weekday = match without_zone.split_once(", ") {
        Some((_, rest)) => rest,
        None => without_zone,
    };

    let day_month_year: Vec<&str> = without_weekday.split_whitespace().take(3).collect();
    if day_month_year.len() < 3 {
        return None;
    }

    NaiveDate::parse_from_str(&day_month_year.join(" "), "%d %b %Y").ok()
}

/// ISO date of the message header, applying `fallback` on parse failure
pub fn header_date_iso(message: &RawMessage, fallback: HeaderDateFallback) -> String {
    if let Some(date) = parse_header_date(&message.date) {
        return date.format("%Y-%m-%d").to_string();
    }

    warn!(
        "Could not parse date header {:?} of message {}, using {:?} fallback",
        message.date, message.id, fallback
    );
    match fallback {
        HeaderDateFallback::Now => Utc::now().date_naive().format("%Y-%m-%d").to_string(),
        HeaderDateFallback::Empty => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gmail_style_header() {
        assert_eq!(
            parse_header_date("Sun, 29 Nov 2020 21:32:07 +0000 (UTC)"),
            NaiveDate::from_ymd_opt(2020, 11, 29)
        );
    }

    #[test]
    fn test_parse_header_without_weekday() {
        assert_eq!(
            parse_header_date("5 Jan 2021 08:00:00 +0100"),
            NaiveDate::from_ymd_opt(2021, 1, 5)
        );
    }

    #[test]
    fn test_parse_header_garbage() {
        assert_eq!(parse_header_date(""), None);
        assert_eq!(parse_header_date("yesterday"), None);
        assert_eq!(parse_header_date("Sun, 31 Feb 2021 10:00:00 +0000"), None);
    }

    #[test]
    fn test_header_date_iso_fallbacks() {
        let message = RawMessage::new("abc", "Total €9.00", "not a date");

        assert_eq!(header_date_iso(&message, HeaderDateFallback::Empty), "");

        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(header_date_iso(&message, HeaderDateFallback::Now), today);
    }

    #[test]
    fn test_fallback_deserializes_lowercase() {
        let fallback: HeaderDateFallback = serde_json::from_str("\"empty\"").unwrap();
        assert_eq!(fallback, HeaderDateFallback::Empty);
    }
}
