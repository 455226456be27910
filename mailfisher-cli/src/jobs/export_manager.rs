use crate::config::{FetchConfig, StorageConfig};
use crate::helpers::fetch_pool::fetch_messages;
use crate::integrations::object_storage::upload_file;
use crate::integrations::MailSource;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use extractors::{parse_messages, write_json_file, ExpenseExtractor, ExpenseParser};
use shared_types::{ExpenseRecord, MessageQuery, RawMessage};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug)]
pub struct ExportSummary {
    pub output_path: PathBuf,
    pub records: usize,
    pub skipped: usize,
    pub uploaded_to: Option<String>,
}

/// Drives one run: search, fetch, parse, export, and the optional upload
pub struct ExportManager {
    source: Arc<dyn MailSource>,
    fetch: FetchConfig,
    storage: Option<StorageConfig>,
}

impl ExportManager {
    pub fn new(source: Arc<dyn MailSource>, fetch: FetchConfig, storage: Option<StorageConfig>) -> Self {
        Self {
            source,
            fetch,
            storage,
        }
    }

    fn query(&self, sender_email: &str, keywords: &str, fetch_body: bool, range: DateRange) -> MessageQuery {
        let mut query = MessageQuery::new(sender_email, keywords);
        query.max_results = self.fetch.max_results;
        query.fetch_body = fetch_body;
        query.start_date = range.start;
        query.end_date = range.end;
        query
    }

    /// Messages matching the query, fetched through the worker pool
    pub async fn fetch(&self, query: MessageQuery) -> Result<Vec<RawMessage>> {
        tracing::info!(
            "Searching messages from {:?} with keywords {:?}",
            query.sender_email,
            query.keywords
        );

        let source = self.source.clone();
        let search_query = query.clone();
        let ids = tokio::task::spawn_blocking(move || source.search(&search_query))
            .await
            .context("Search task failed")??;
        tracing::info!("Found {} matching messages", ids.len());

        Ok(fetch_messages(self.source.clone(), ids, query.fetch_body, self.fetch.workers).await)
    }

    /// Messages picked by a free-form sender and keyword filter
    pub async fn fetch_matching(
        &self,
        sender_email: &str,
        keywords: &str,
        fetch_body: bool,
        range: DateRange,
    ) -> Result<Vec<RawMessage>> {
        self.fetch(self.query(sender_email, keywords, fetch_body, range)).await
    }

    /// Records from every parser, in parser order, plus the number of skipped messages
    pub async fn collect(&self, parsers: &[ExpenseParser], range: DateRange) -> Result<(Vec<ExpenseRecord>, usize)> {
        let mut records = Vec::new();
        let mut skipped = 0;

        for parser in parsers {
            let query = self.query(
                parser.sender_email(),
                parser.keywords(),
                parser.requires_body(),
                range,
            );
            let messages = self.fetch(query).await?;
            let batch = parse_messages(parser, &messages);

            skipped += batch.failures.len();
            records.extend(batch.records);
        }

        Ok((records, skipped))
    }

    pub async fn export(
        &self,
        parsers: &[ExpenseParser],
        range: DateRange,
        output_path: PathBuf,
        upload: bool,
    ) -> Result<ExportSummary> {
        let (records, skipped) = self.collect(parsers, range).await?;

        write_json_file(&output_path, &records)
            .with_context(|| format!("Failed to export expenses to {:?}", output_path))?;

        let uploaded_to = if upload { self.upload(&output_path).await } else { None };

        Ok(ExportSummary {
            output_path,
            records: records.len(),
            skipped,
            uploaded_to,
        })
    }

    /// Best effort: the local export stays valid whatever happens here
    async fn upload(&self, output_path: &std::path::Path) -> Option<String> {
        let Some(storage) = &self.storage else {
            tracing::warn!("Upload requested but no [storage] section is configured");
            return None;
        };

        match upload_file(storage, output_path).await {
            Ok(url) => {
                tracing::info!("Uploaded {:?} to {}", output_path, url);
                Some(url)
            }
            Err(e) => {
                tracing::error!("Failed to upload {:?}: {:#}", output_path, e);
                None
            }
        }
    }
}
