use super::message_parser::parse_raw_message;
use super::MailSource;
use anyhow::{Context, Result};
use extractors::parse_header_date;
use shared_types::{MessageQuery, RawMessage};
use std::path::{Path, PathBuf};

/// A directory of `.eml` files, one message per file, id = file stem.
/// Filtering happens client side.
pub struct EmlDirSource {
    dir: PathBuf,
}

impl EmlDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            anyhow::bail!("{:?} is not a directory", dir);
        }
        Ok(Self { dir })
    }

    fn message_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.eml", id))
    }

    fn eml_ids(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read directory {:?}", self.dir))?;

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_eml(path))
            .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

fn is_eml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("eml"))
        .unwrap_or(false)
}

fn in_date_range(message: &RawMessage, query: &MessageQuery) -> bool {
    if query.start_date.is_none() && query.end_date.is_none() {
        return true;
    }
    let Some(date) = parse_header_date(&message.date) else {
        return false;
    };
    query.start_date.map_or(true, |start| date >= start)
        && query.end_date.map_or(true, |end| date < end)
}

impl MailSource for EmlDirSource {
    fn search(&self, query: &MessageQuery) -> Result<Vec<String>> {
        let mut matches = Vec::new();

        for id in self.eml_ids()? {
            let message = match self.fetch(&id, true) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!("Skipping unreadable message {}: {}", id, e);
                    continue;
                }
            };

            let text = format!(
                "{} {}",
                message.subject,
                message.body.as_deref().unwrap_or_default()
            );
            if query.matches(&message.sender, &text) && in_date_range(&message, query) {
                let date = parse_header_date(&message.date);
                matches.push((date, id));
            }
        }

        // Most recent first
        matches.sort_by(|a, b| b.0.cmp(&a.0));
        matches.truncate(query.max_results);
        tracing::info!("Found {} matching messages in {:?}", matches.len(), self.dir);

        Ok(matches.into_iter().map(|(_, id)| id).collect())
    }

    fn fetch(&self, id: &str, fetch_body: bool) -> Result<RawMessage> {
        let path = self.message_path(id);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read .eml file at {:?}", path))?;
        parse_raw_message(id, &bytes, fetch_body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::message_parser::tests::{STATEMENT_EML, UBER_EATS_EML};

    fn mailbox() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("uber.eml"), UBER_EATS_EML).unwrap();
        std::fs::write(dir.path().join("statement.eml"), STATEMENT_EML).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a message").unwrap();
        dir
    }

    #[test]
    fn test_search_by_sender_and_keywords() {
        let dir = mailbox();
        let source = EmlDirSource::new(dir.path()).unwrap();

        let ids = source
            .search(&MessageQuery::new("uber.portugal@uber.com", "Total"))
            .unwrap();
        assert_eq!(ids, vec!["uber"]);

        let ids = source.search(&MessageQuery::new("", "")).unwrap();
        assert_eq!(ids, vec!["statement", "uber"]);
    }

    #[test]
    fn test_search_by_date_range() {
        let dir = mailbox();
        let source = EmlDirSource::new(dir.path()).unwrap();

        let mut query = MessageQuery::new("", "");
        query.start_date = chrono::NaiveDate::from_ymd_opt(2021, 1, 1);
        assert_eq!(source.search(&query).unwrap(), vec!["statement"]);
    }

    #[test]
    fn test_fetch_message() {
        let dir = mailbox();
        let source = EmlDirSource::new(dir.path()).unwrap();

        let message = source.fetch("uber", false).unwrap();
        assert_eq!(message.id, "uber");
        assert!(message.body.is_none());

        assert!(source.fetch("missing", false).is_err());
    }

    #[test]
    fn test_rejects_missing_directory() {
        assert!(EmlDirSource::new("/nonexistent/mailbox").is_err());
    }
}
