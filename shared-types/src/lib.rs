pub mod email;
pub mod expense;
pub mod extraction;

pub use email::{MessageAttachment, MessageQuery, RawMessage};
pub use expense::{
    BankExpense, ExpenseRecord, FoodExpense, FoodService, TransactionType, TransportService,
    TransportationExpense,
};
pub use extraction::{ExpenseExtractor, ExtractionError, RecordFailure};
