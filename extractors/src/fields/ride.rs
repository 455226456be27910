use super::{body_text, or_sentinel};
use crate::text_normalizer::parse_euros;
use chrono::NaiveDate;
use regex::Regex;
use shared_types::RawMessage;
use std::sync::OnceLock;

const BODY_DATE_FORMATS: &[&str] = &[
    "%d.%m.%Y", "%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d", "%d %B %Y", "%d %b %Y", "%B %d, %Y",
    "%b %d, %Y",
];

fn distance_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"distance\s+(\d+(?:[.,]\d+)?)\s*km").expect("invalid distance regex"))
}

fn km_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*km").expect("invalid km regex"))
}

fn time_span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{2}:\d{2} .* \d{2}:\d{2}").expect("invalid time span regex"))
}

fn subject_total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Total\s+(?:€\s*(\d+(?:[.,]\d{1,2})?)|(\d+(?:[.,]\d{1,2})?)\s*€)")
            .expect("invalid total regex")
    })
}

fn subject_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\D{0,2}(\d{2})\.(\d{2})\.(\d{4})").expect("invalid date regex"))
}

fn body_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\d{1,2}[./-]\d{1,2}[./-]\d{4}|\d{4}-\d{2}-\d{2}|\d{1,2} [A-Za-z]+ \d{4}|[A-Za-z]+ \d{1,2}, \d{4}",
        )
        .expect("invalid body date regex")
    })
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse().ok()
}

/// Trip distance in km, 0 when unrecoverable
pub fn distance_km(message: &RawMessage) -> f64 {
    or_sentinel(message, "distance (km)", &[subject_distance, body_distance], 0.0)
}

/// Pickup and dropoff addresses; each leg falls back to "" on its own
pub fn addresses(message: &RawMessage) -> (String, String) {
    let from = or_sentinel(message, "from address", &[subject_from, body_pickup], String::new());
    let to = or_sentinel(message, "to address", &[subject_to, body_dropoff], String::new());
    (from, to)
}

/// Amount charged, 0 when unrecoverable
pub fn total_euros(message: &RawMessage) -> f64 {
    or_sentinel(
        message,
        "total payed (e.g. 12.30€)",
        &[subject_total, body_total],
        0.0,
    )
}

/// ISO trip date, "" when unrecoverable
pub fn trip_date(message: &RawMessage) -> String {
    or_sentinel(message, "date", &[subject_date, body_date], String::new())
}

fn subject_distance(message: &RawMessage) -> Option<f64> {
    let caps = distance_re().captures(&message.subject)?;
    parse_decimal(&caps[1])
}

fn body_distance(message: &RawMessage) -> Option<f64> {
    let text = body_text(message)?;
    text.lines()
        .filter(|line| line.contains("km"))
        .find_map(|line| parse_decimal(&km_re().captures(line)?[1]))
}

/// Segment `index` of "HH:MM <from> HH:MM <to> HH:MM" split on colons, minus
/// the leading minutes and the trailing hour
fn subject_address(message: &RawMessage, index: usize) -> Option<String> {
    let span = time_span_re().find(&message.subject)?.as_str();
    let segment = span.split(':').nth(index)?;
    if segment.len() < 6 {
        return None;
    }
    let address = segment.get(3..segment.len() - 3)?.trim();
    (!address.is_empty()).then(|| address.to_string())
}

fn subject_from(message: &RawMessage) -> Option<String> {
    subject_address(message, 1)
}

fn subject_to(message: &RawMessage) -> Option<String> {
    subject_address(message, 2)
}

/// "Pickup: 21:05 | Rua Augusta 10, Lisboa" style body lines
fn body_address(message: &RawMessage, label: &str) -> Option<String> {
    let text = body_text(message)?;
    let line = text.lines().find(|line| line.contains(label))?;
    let (_, rest) = line.split_once(label)?;
    rest.split('|')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .last()
        .map(str::to_string)
}

fn body_pickup(message: &RawMessage) -> Option<String> {
    body_address(message, "Pickup:")
}

fn body_dropoff(message: &RawMessage) -> Option<String> {
    body_address(message, "Dropoff:")
}

fn subject_total(message: &RawMessage) -> Option<f64> {
    let caps = subject_total_re().captures(&message.subject)?;
    let amount = caps.get(1).or_else(|| caps.get(2))?;
    parse_euros(amount.as_str())
}

fn body_total(message: &RawMessage) -> Option<f64> {
    let text = body_text(message)?;
    text.lines()
        .filter(|line| line.contains("Total"))
        .filter_map(|line| line.split_once(':').map(|(_, amount)| amount))
        .find_map(|amount| amount.split('€').find_map(parse_euros))
}

/// "­19.06.2021 ..." with at most two marker characters in front
fn subject_date(message: &RawMessage) -> Option<String> {
    let caps = subject_date_re().captures(&message.subject)?;
    let date = NaiveDate::from_ymd_opt(
        caps[3].parse().ok()?,
        caps[2].parse().ok()?,
        caps[1].parse().ok()?,
    )?;
    Some(date.format("%Y-%m-%d").to_string())
}

fn body_date(message: &RawMessage) -> Option<String> {
    let text = body_text(message)?;
    body_date_re()
        .find_iter(&text)
        .find_map(|found| {
            BODY_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(found.as_str(), format).ok())
        })
        .map(|date| date.format("%Y-%m-%d").to_string())
}
