use serde::{Deserialize, Serialize};

/// A message as delivered by a mail source, already filtered by sender and keywords
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,

    // Provider snippet: the first line(s) of the rendered message text
    pub subject: String,
    pub body: Option<String>,

    // Raw `Date` header, e.g. "Sun, 29 Nov 2020 21:32:07 +0000 (UTC)"
    pub date: String,

    pub sender: String,
    pub attachments: Vec<MessageAttachment>,
}

impl RawMessage {
    pub fn new(id: impl Into<String>, subject: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            body: None,
            date: date.into(),
            sender: String::new(),
            attachments: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn pdf_attachments(&self) -> impl Iterator<Item = &MessageAttachment> {
        self.attachments.iter().filter(|a| a.is_pdf())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAttachment {
    pub filename: String,
    pub content_type: String,
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl MessageAttachment {
    pub fn is_pdf(&self) -> bool {
        self.content_type.to_lowercase().contains("pdf")
            || self.filename.to_lowercase().ends_with(".pdf")
    }
}

/// Search criteria handed to a mail source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageQuery {
    pub sender_email: String,
    pub keywords: String,
    pub max_results: usize,
    pub fetch_body: bool,

    // Inclusive lower and exclusive upper bound, YYYY-MM-DD
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
}

impl MessageQuery {
    pub fn new(sender_email: impl Into<String>, keywords: impl Into<String>) -> Self {
        Self {
            sender_email: sender_email.into(),
            keywords: keywords.into(),
            max_results: 1000,
            fetch_body: false,
            start_date: None,
            end_date: None,
        }
    }

    /// Case-insensitive check used by sources that cannot filter server-side
    pub fn matches(&self, sender: &str, text: &str) -> bool {
        let sender_ok = self.sender_email.is_empty()
            || sender
                .to_lowercase()
                .contains(&self.sender_email.to_lowercase());
        let text = text.to_lowercase();
        let keywords_ok = self
            .keywords
            .split_whitespace()
            .all(|kw| text.contains(&kw.to_lowercase()));
        sender_ok && keywords_ok
    }
}
