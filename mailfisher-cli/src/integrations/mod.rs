pub mod eml_source;
pub mod message_parser;
pub mod object_storage;
pub mod real_imap_client;

use anyhow::Result;
use shared_types::{MessageQuery, RawMessage};

/// Where messages come from. Calls block; the fetch pool runs them off the runtime.
pub trait MailSource: Send + Sync {
    /// Ids of the messages matching `query`, most recent first, at most `query.max_results`
    fn search(&self, query: &MessageQuery) -> Result<Vec<String>>;

    /// One message. Body and attachments are only filled in when `fetch_body` is set.
    fn fetch(&self, id: &str, fetch_body: bool) -> Result<RawMessage>;
}
