//! Per-field pattern matchers. Each field tries a primary pattern and then
//! its fallbacks; optional fields end in a sentinel instead of an error.

pub mod bank;
pub mod food;
pub mod header_date;
pub mod html;
pub mod ride;

use shared_types::RawMessage;
use tracing::warn;

/// One way of recovering a field from a message
pub type Strategy<T> = fn(&RawMessage) -> Option<T>;

/// Result of the first strategy that recovers the field
pub fn first_match<T>(message: &RawMessage, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(message))
}

/// Like `first_match`, but a miss is logged and replaced by `sentinel`
pub fn or_sentinel<T>(
    message: &RawMessage,
    field: &str,
    strategies: &[Strategy<T>],
    sentinel: T,
) -> T {
    match first_match(message, strategies) {
        Some(value) => value,
        None => {
            warn!("Could not match {} with message_id='{}'", field, message.id);
            sentinel
        }
    }
}

/// Body as plain text, converting HTML bodies first
pub(crate) fn body_text(message: &RawMessage) -> Option<String> {
    let body = message.body.as_deref()?;
    if html::is_html(body) {
        Some(html::html_to_text(body))
    } else {
        Some(body.to_string())
    }
}
