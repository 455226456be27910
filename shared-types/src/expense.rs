use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Food delivery services with a receipt parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
pub enum FoodService {
    #[serde(rename = "Uber Eats")]
    UberEats,
    #[serde(rename = "Bolt Food")]
    BoltFood,
}

/// Ride-hailing services with a receipt parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
pub enum TransportService {
    Bolt,
    Uber,
}

/// A food delivery order extracted from one receipt email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct FoodExpense {
    pub id: String,
    pub service: FoodService,
    pub restaurant: String,
    // Amount charged; None when the receipt total could not be recovered
    pub total_euros: Option<f64>,
    pub date: String,
}

/// A ride extracted from one trip receipt email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct TransportationExpense {
    pub id: String,
    pub service: TransportService,
    pub distance_km: f64,
    pub from_address: String,
    pub to_address: String,
    pub total_euros: f64,
    pub date: String,
}

impl TransportationExpense {
    /// Two receipts describe the same trip when everything but the message id matches.
    /// Floats are compared exactly, as parsed.
    pub fn same_trip(&self, other: &TransportationExpense) -> bool {
        self.service == other.service
            && self.distance_km == other.distance_km
            && self.from_address == other.from_address
            && self.to_address == other.to_address
            && self.total_euros == other.total_euros
            && self.date == other.date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionType {
    Debit,
    Credit,
}

impl TransactionType {
    pub fn from_signed_amount(amount: &str) -> Self {
        if amount.contains('-') {
            TransactionType::Debit
        } else {
            TransactionType::Credit
        }
    }
}

/// One transaction line of a bank statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct BankExpense {
    pub id: String,
    pub description: String,
    // Magnitude only, as printed on the statement
    pub total_euros: String,
    pub date: String,
    pub transaction_type: TransactionType,
    pub category: String,
}

impl BankExpense {
    /// Builds the record from a signed statement amount; the sign only survives
    /// as the transaction type.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        signed_total: &str,
        date: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            total_euros: signed_total.replace('-', ""),
            date: date.into(),
            transaction_type: TransactionType::from_signed_amount(signed_total),
            category: category.into(),
        }
    }
}

/// Any exported record. Serializes flat, without a variant tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
pub enum ExpenseRecord {
    Food(FoodExpense),
    Transportation(TransportationExpense),
    Bank(BankExpense),
}

impl ExpenseRecord {
    pub fn id(&self) -> &str {
        match self {
            ExpenseRecord::Food(e) => &e.id,
            ExpenseRecord::Transportation(e) => &e.id,
            ExpenseRecord::Bank(e) => &e.id,
        }
    }

    pub fn date(&self) -> &str {
        match self {
            ExpenseRecord::Food(e) => &e.date,
            ExpenseRecord::Transportation(e) => &e.date,
            ExpenseRecord::Bank(e) => &e.date,
        }
    }
}

impl From<FoodExpense> for ExpenseRecord {
    fn from(expense: FoodExpense) -> Self {
        ExpenseRecord::Food(expense)
    }
}

impl From<TransportationExpense> for ExpenseRecord {
    fn from(expense: TransportationExpense) -> Self {
        ExpenseRecord::Transportation(expense)
    }
}

impl From<BankExpense> for ExpenseRecord {
    fn from(expense: BankExpense) -> Self {
        ExpenseRecord::Bank(expense)
    }
}
