use crate::{ExpenseRecord, RawMessage};

/// Core trait implemented by every provider parser
pub trait ExpenseExtractor {
    /// Sender address used to select messages
    fn sender_email(&self) -> &str;

    /// Keywords used to select messages
    fn keywords(&self) -> &str;

    /// Whether the extractor reads the message body (or attachments)
    /// rather than the subject alone
    fn requires_body(&self) -> bool;

    /// Build the records carried by one message
    fn extract(&self, message: &RawMessage) -> Result<Vec<ExpenseRecord>, ExtractionError>;
}

/// Reasons a required field could not be extracted
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Restaurant not found in subject")]
    RestaurantNotFound,

    #[error("Missing token for {field}: {detail}")]
    MissingToken { field: &'static str, detail: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Message has no statement attachment")]
    MissingAttachment,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ExtractionError {
    pub fn missing(field: &'static str, detail: impl Into<String>) -> Self {
        ExtractionError::MissingToken {
            field,
            detail: detail.into(),
        }
    }
}

/// A message that produced no record, reported by the batch driver
#[derive(Debug, thiserror::Error)]
#[error("Failed to build record for message {message_id} (subject={subject:?}): {source}")]
pub struct RecordFailure {
    pub message_id: String,
    pub subject: String,
    #[source]
    pub source: ExtractionError,
}

impl RecordFailure {
    pub fn new(message: &RawMessage, source: ExtractionError) -> Self {
        Self {
            message_id: message.id.clone(),
            subject: message.subject.clone(),
            source,
        }
    }
}
