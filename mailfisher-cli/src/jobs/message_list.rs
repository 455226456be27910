use extractors::parse_header_date;
use shared_types::RawMessage;

const SUBJECT_CHARS: usize = 80;

/// One line per message: id, ISO date (or the raw header) and a shortened subject
pub fn format_listing(messages: &[RawMessage]) -> Vec<String> {
    messages
        .iter()
        .map(|message| {
            let date = parse_header_date(&message.date)
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| message.date.clone());

            let mut subject: String = message.subject.chars().take(SUBJECT_CHARS).collect();
            if message.subject.chars().count() > SUBJECT_CHARS {
                subject.push_str("...");
            }

            format!("{}\t{}\t{}", message.id, date, subject)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_listing() {
        let messages = vec![
            RawMessage::new("17570b788e2319d0", "Total €16.95", "Wed, 28 Oct 2020 19:37:56 +0000 (UTC)"),
            RawMessage::new("x", "a".repeat(90), "unknown"),
        ];

        let lines = format_listing(&messages);
        assert_eq!(lines[0], "17570b788e2319d0\t2020-10-28\tTotal €16.95");
        assert_eq!(lines[1], format!("x\tunknown\t{}...", "a".repeat(80)));
    }
}
