use anyhow::{Context, Result};
use mail_parser::{Message, MessageParser, MimeHeaders};
use shared_types::{MessageAttachment, RawMessage};

const SNIPPET_CHARS: usize = 200;

/// Builds a `RawMessage` from RFC 822 bytes. The subject field carries a snippet
/// of the rendered text, the way webmail search results show it.
pub fn parse_raw_message(id: &str, bytes: &[u8], fetch_body: bool) -> Result<RawMessage> {
    let parsed = MessageParser::default()
        .parse(bytes)
        .with_context(|| format!("Failed to parse message {}", id))?;

    let mut message = RawMessage::new(id, snippet(&parsed), header_date(&parsed));
    message.sender = parsed
        .from()
        .and_then(|addrs| addrs.first())
        .and_then(|addr| addr.address())
        .map(|a| a.to_string())
        .unwrap_or_default();

    if fetch_body {
        message.body = parsed
            .body_html(0)
            .filter(|html| html.to_lowercase().contains("<html"))
            .or_else(|| parsed.body_text(0))
            .map(|body| body.into_owned());
        message.attachments = attachments(&parsed);
    }

    Ok(message)
}

/// Invisible format characters (soft hyphen, zero-width marks, BOM) that
/// receipt templates scatter through their text
fn is_format_char(c: char) -> bool {
    matches!(
        c,
        '\u{ad}' | '\u{200b}'..='\u{200f}' | '\u{202a}'..='\u{202e}' | '\u{2060}'..='\u{2064}' | '\u{feff}'
    )
}

fn snippet(parsed: &Message) -> String {
    let text = parsed
        .body_text(0)
        .map(|text| {
            let visible: String = text.chars().filter(|c| !is_format_char(*c)).collect();
            visible.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .unwrap_or_default();

    if text.is_empty() {
        parsed.subject().unwrap_or_default().to_string()
    } else {
        text.chars().take(SNIPPET_CHARS).collect()
    }
}

fn header_date(parsed: &Message) -> String {
    parsed
        .header_raw("Date")
        .map(|raw| raw.trim().to_string())
        .or_else(|| parsed.date().map(|date| date.to_rfc822()))
        .unwrap_or_default()
}

fn attachments(parsed: &Message) -> Vec<MessageAttachment> {
    parsed
        .attachments()
        .map(|part| {
            let content_type = part
                .content_type()
                .map(|ct| match ct.subtype() {
                    Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
                    None => ct.ctype().to_string(),
                })
                .unwrap_or_default();

            MessageAttachment {
                filename: part.attachment_name().unwrap_or("attachment").to_string(),
                content_type,
                content: part.contents().to_vec(),
            }
        })
        .collect()
}
