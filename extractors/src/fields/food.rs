use super::body_text;
use crate::text_normalizer::{dmy_to_iso, normalize_restaurant, parse_euros, FilterTable};
use regex::Regex;
use shared_types::{ExtractionError, RawMessage};
use std::sync::OnceLock;
use tracing::warn;

fn bolt_restaurant_hyphen_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"From .* -").expect("invalid restaurant regex"))
}

fn bolt_restaurant_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"From .*,").expect("invalid restaurant regex"))
}

fn bolt_total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*(\d{1,3}\.\d{2})€\*").expect("invalid total regex"))
}

/// "... From Sushicome - Saldanha ..." or "... From Chickinho Rua ..., 1070 ..."
pub fn bolt_food_restaurant(
    message: &RawMessage,
    filters: &FilterTable,
) -> Result<String, ExtractionError> {
    let subject = &message.subject;

    let raw = if let Some(found) = bolt_restaurant_hyphen_re().find(subject) {
        // Drop the leading "From " and the trailing " -"
        let matched = found.as_str();
        matched[5..matched.len() - 2].to_string()
    } else if let Some(found) = bolt_restaurant_comma_re().find(subject) {
        let matched = &found.as_str()[5..];
        matched.split(',').next().unwrap_or_default().to_string()
    } else {
        return Err(ExtractionError::RestaurantNotFound);
    };

    Ok(normalize_restaurant(&raw, filters))
}

/// Amount after "Total charged:" in the receipt body. Missing totals are not
/// fatal for Bolt Food records.
pub fn bolt_food_total(message: &RawMessage) -> Option<f64> {
    let Some(text) = body_text(message) else {
        warn!("Message {} has no body, total left empty", message.id);
        return None;
    };

    let charged = match text.split_once("Total charged:") {
        Some((_, rest)) => rest,
        None => text.as_str(),
    };

    let total = bolt_total_re()
        .captures(charged)
        .and_then(|caps| parse_euros(&caps[1]));
    if total.is_none() {
        warn!("Could not match total payed with message_id='{}'", message.id);
    }
    total
}

/// Leading "DD-MM-YYYY" token of the subject
pub fn bolt_food_date(message: &RawMessage) -> Result<String, ExtractionError> {
    let token = message.subject.split_whitespace().next().unwrap_or_default();
    dmy_to_iso(token).ok_or_else(|| ExtractionError::InvalidDate(token.to_string()))
}

/// "... Here's your receipt for Pizza Lizzy. Total ..."
pub fn uber_eats_restaurant(
    message: &RawMessage,
    filters: &FilterTable,
) -> Result<String, ExtractionError> {
    let after = message
        .subject
        .split("receipt for ")
        .nth(1)
        .ok_or_else(|| ExtractionError::missing("restaurant", "no \"receipt for \" in subject"))?;
    let raw = after.split('.').next().unwrap_or_default();

    Ok(normalize_restaurant(raw, filters))
}

/// "Total €16.95 28 October 2020 ..." carries the total as second token
pub fn uber_eats_total(message: &RawMessage) -> Result<f64, ExtractionError> {
    let token = message
        .subject
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| ExtractionError::missing("total", "subject has fewer than two tokens"))?;

    parse_euros(token).ok_or_else(|| ExtractionError::InvalidAmount(token.to_string()))
}
