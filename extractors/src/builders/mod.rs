//! Provider parsers. Each variant carries its message selection and the data
//! tables it needs, and turns one raw message into records.

use crate::dedup::drop_duplicate_rides;
use crate::fields::header_date::{header_date_iso, HeaderDateFallback};
use crate::fields::{bank, food, ride};
use crate::text_normalizer::{CategoryRule, FilterTable, FilterTables};
use shared_types::{
    ExpenseExtractor, ExpenseRecord, ExtractionError, FoodExpense, FoodService, RawMessage,
    RecordFailure, TransportService, TransportationExpense,
};
use tracing::{error, info};

/// How messages are picked from the mailbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub sender_email: String,
    pub keywords: String,
    pub requires_body: bool,
}

impl Selection {
    fn new(sender_email: &str, keywords: &str, requires_body: bool) -> Self {
        Self {
            sender_email: sender_email.to_string(),
            keywords: keywords.to_string(),
            requires_body,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExpenseParser {
    BoltFood {
        selection: Selection,
        filters: FilterTable,
    },
    UberEats {
        selection: Selection,
        filters: FilterTable,
        date_fallback: HeaderDateFallback,
    },
    BoltRide {
        selection: Selection,
    },
    UberRide {
        selection: Selection,
    },
    BancoCtt {
        selection: Selection,
        categories: Vec<CategoryRule>,
    },
}

impl ExpenseParser {
    pub fn bolt_food(tables: &FilterTables) -> Self {
        ExpenseParser::BoltFood {
            selection: Selection::new("portugal-food@bolt.eu", "Delivery from Bolt Food", true),
            filters: tables.bolt_food.clone(),
        }
    }

    pub fn uber_eats(tables: &FilterTables, date_fallback: HeaderDateFallback) -> Self {
        ExpenseParser::UberEats {
            selection: Selection::new("uber.portugal@uber.com", "Total", false),
            filters: tables.uber_eats.clone(),
            date_fallback,
        }
    }

    pub fn bolt_ride() -> Self {
        ExpenseParser::BoltRide {
            selection: Selection::new("receipts-portugal@bolt.eu", "Your Bolt Trip On", true),
        }
    }

    pub fn uber_ride() -> Self {
        ExpenseParser::UberRide {
            selection: Selection::new("uber.portugal@uber.com", "Your trip", true),
        }
    }

    pub fn banco_ctt(tables: &FilterTables) -> Self {
        ExpenseParser::BancoCtt {
            selection: Selection::new("documentos@bancoctt.pt", "Extrato", true),
            categories: tables.bank_categories.clone(),
        }
    }

    /// Replaces the default sender and keywords with the ones given on the command line
    pub fn with_selection(mut self, sender_email: Option<String>, keywords: Option<String>) -> Self {
        let selection = self.selection_mut();
        if let Some(sender_email) = sender_email {
            selection.sender_email = sender_email;
        }
        if let Some(keywords) = keywords {
            selection.keywords = keywords;
        }
        self
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExpenseParser::BoltFood { .. } => "Bolt Food",
            ExpenseParser::UberEats { .. } => "Uber Eats",
            ExpenseParser::BoltRide { .. } => "Bolt",
            ExpenseParser::UberRide { .. } => "Uber",
            ExpenseParser::BancoCtt { .. } => "Banco CTT",
        }
    }

    /// Uber sends repeated notifications for the same trip
    pub fn deduplicates(&self) -> bool {
        matches!(self, ExpenseParser::UberRide { .. })
    }

    pub fn selection(&self) -> &Selection {
        match self {
            ExpenseParser::BoltFood { selection, .. }
            | ExpenseParser::UberEats { selection, .. }
            | ExpenseParser::BoltRide { selection }
            | ExpenseParser::UberRide { selection }
            | ExpenseParser::BancoCtt { selection, .. } => selection,
        }
    }

    fn selection_mut(&mut self) -> &mut Selection {
        match self {
            ExpenseParser::BoltFood { selection, .. }
            | ExpenseParser::UberEats { selection, .. }
            | ExpenseParser::BoltRide { selection }
            | ExpenseParser::UberRide { selection }
            | ExpenseParser::BancoCtt { selection, .. } => selection,
        }
    }
}

fn ride_record(message: &RawMessage, service: TransportService) -> ExpenseRecord {
    let distance_km = ride::distance_km(message);
    let (from_address, to_address) = ride::addresses(message);
    let total_euros = ride::total_euros(message);
    let date = ride::trip_date(message);

    TransportationExpense {
        id: message.id.clone(),
        service,
        distance_km,
        from_address,
        to_address,
        total_euros,
        date,
    }
    .into()
}

impl ExpenseExtractor for ExpenseParser {
    fn sender_email(&self) -> &str {
        &self.selection().sender_email
    }

    fn keywords(&self) -> &str {
        &self.selection().keywords
    }

    fn requires_body(&self) -> bool {
        self.selection().requires_body
    }

    fn extract(&self, message: &RawMessage) -> Result<Vec<ExpenseRecord>, ExtractionError> {
        match self {
            ExpenseParser::BoltFood { filters, .. } => {
                let restaurant = food::bolt_food_restaurant(message, filters)?;
                let total_euros = food::bolt_food_total(message);
                let date = food::bolt_food_date(message)?;

                Ok(vec![FoodExpense {
                    id: message.id.clone(),
                    service: FoodService::BoltFood,
                    restaurant,
                    total_euros,
                    date,
                }
                .into()])
            }
            ExpenseParser::UberEats {
                filters,
                date_fallback,
                ..
            } => {
                let restaurant = food::uber_eats_restaurant(message, filters)?;
                let total_euros = food::uber_eats_total(message)?;
                let date = header_date_iso(message, *date_fallback);

                Ok(vec![FoodExpense {
                    id: message.id.clone(),
                    service: FoodService::UberEats,
                    restaurant,
                    total_euros: Some(total_euros),
                    date,
                }
                .into()])
            }
            ExpenseParser::BoltRide { .. } => Ok(vec![ride_record(message, TransportService::Bolt)]),
            ExpenseParser::UberRide { .. } => Ok(vec![ride_record(message, TransportService::Uber)]),
            ExpenseParser::BancoCtt { categories, .. } => {
                let expenses = bank::statement_expenses(message, categories)?;
                Ok(expenses.into_iter().map(ExpenseRecord::from).collect())
            }
        }
    }
}

/// Records built from a batch, plus the messages that produced none
#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub records: Vec<ExpenseRecord>,
    pub failures: Vec<RecordFailure>,
}

/// Runs `parser` over every message. A failing message is logged and skipped;
/// ride duplicates are dropped afterwards when the parser asks for it.
pub fn parse_messages(parser: &ExpenseParser, messages: &[RawMessage]) -> ParsedBatch {
    info!("Parsing {} {} messages", messages.len(), parser.name());

    let mut batch = ParsedBatch::default();
    for message in messages {
        match parser.extract(message) {
            Ok(records) => batch.records.extend(records),
            Err(source) => {
                let failure = RecordFailure::new(message, source);
                error!("{}", failure);
                batch.failures.push(failure);
            }
        }
    }

    if parser.deduplicates() {
        batch.records = drop_duplicate_rides(batch.records);
    }

    info!(
        "Built {} {} records, skipped {} messages",
        batch.records.len(),
        parser.name(),
        batch.failures.len()
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bolt_food_messages() -> Vec<RawMessage> {
        vec![
            RawMessage::new(
                "179f7511b28528cd",
                "10-06-2021 Bon Appetit, Valter! This is your receipt. From Chickinho Rua Marquês de Fronteira \
                 117F, 1070-292 Lisboa To XXX, Lisbon 1 Breast Classic Sauce 6.90€ 2 Wedges with Herbs",
                "Thu, 10 Jun 2021 19:05:57 +0000 (UTC)",
            )
            .with_body(
                "\u{ad}19-06-2021\n*Bon Appetit,\nValter!*\n\nThis is your receipt.\n\n\
                 Delivery fee\n\n1.50€\n\nSmall order fee\n\n: \n\n*Total charged:*\n\n*9.73€*\n\n\
                 Download cost document Food",
            ),
            RawMessage::new(
                "17914b9e89b41e02",
                "27-04-2021 Bon Appetit, Valter! This is your receipt. From Sushicome - Saldanha Av. Miguel \
                 Bombarda, 23B - Lisboa 1050161 To XXX, Lisbon 1 BREADED SHRIMP CALIFORNIA (15 pieces) Soy",
                "Tue, 27 Apr 2021 19:06:37 +0000 (UTC)",
            )
            .with_body("*Total charged:*\n\n*15.80€*\n\nDownload cost document Food"),
        ]
    }

    fn uber_eats_messages() -> Vec<RawMessage> {
        vec![
            RawMessage::new(
                "17570b788e2319d0",
                "Total €16.95 28 October 2020 Thanks for ordering, Valter Here&#39;s your receipt for Pizza \
                 Lizzy. Total €16.95 2 Pizza Média c/ 4 ingredientes à escolha!!! €14.55 Escolha até 4 \
                 ingredientes Azeite",
                "Wed, 28 Oct 2020 19:37:56 +0000 (UTC)",
            ),
            RawMessage::new(
                "174a7fef0d8cdef3",
                "Total €10.90 19 September 2020 Thanks for ordering, Valter Here&#39;s your receipt for Poke \
                 House 🐠 (Saldanha). Total €10.90 1 Mixed Seas €8.50 Escolha o tamanho do bowl: Regular €0.00 \
                 Deseja Topping ",
                "Sat, 19 Sep 2020 20:12:14 +0000 (UTC)",
            ),
        ]
    }

    fn food(id: &str, service: FoodService, restaurant: &str, total: f64, date: &str) -> ExpenseRecord {
        FoodExpense {
            id: id.to_string(),
            service,
            restaurant: restaurant.to_string(),
            total_euros: Some(total),
            date: date.to_string(),
        }
        .into()
    }

    #[test]
    fn test_parse_bolt_food_messages() {
        let parser = ExpenseParser::bolt_food(&FilterTables::builtin());
        let batch = parse_messages(&parser, &bolt_food_messages());

        assert!(batch.failures.is_empty());
        assert_eq!(
            batch.records,
            vec![
                food("179f7511b28528cd", FoodService::BoltFood, "Chickinho", 9.73, "2021-06-10"),
                food("17914b9e89b41e02", FoodService::BoltFood, "Sushicome", 15.8, "2021-04-27"),
            ]
        );
    }

    #[test]
    fn test_parse_uber_eats_messages() {
        let parser = ExpenseParser::uber_eats(&FilterTables::builtin(), HeaderDateFallback::Now);
        let batch = parse_messages(&parser, &uber_eats_messages());

        assert!(batch.failures.is_empty());
        assert_eq!(
            batch.records,
            vec![
                food("17570b788e2319d0", FoodService::UberEats, "Pizza Lizzy", 16.95, "2020-10-28"),
                food("174a7fef0d8cdef3", FoodService::UberEats, "Poke House", 10.9, "2020-09-19"),
            ]
        );
    }

    #[test]
    fn test_failing_message_does_not_stop_the_batch() {
        let mut messages = bolt_food_messages();
        messages.insert(
            1,
            RawMessage::new("broken", "10-06-2021 Your courier is nearby", "").with_body("*9.00€*"),
        );

        let parser = ExpenseParser::bolt_food(&FilterTables::builtin());
        let batch = parse_messages(&parser, &messages);

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].message_id, "broken");
        assert!(matches!(
            batch.failures[0].source,
            ExtractionError::RestaurantNotFound
        ));
    }

    #[test]
    fn test_bolt_food_without_body_keeps_record() {
        let message = RawMessage::new(
            "no-body",
            "10-06-2021 This is your receipt. From Udon Av. Duque de Ávila 46B, 1000 Lisboa",
            "",
        );
        let parser = ExpenseParser::bolt_food(&FilterTables::builtin());
        let records = parser.extract(&message).unwrap();

        assert_eq!(
            records,
            vec![ExpenseRecord::Food(FoodExpense {
                id: "no-body".to_string(),
                service: FoodService::BoltFood,
                restaurant: "Udon".to_string(),
                total_euros: None,
                date: "2021-06-10".to_string(),
            })]
        );
    }

    #[test]
    fn test_uber_rides_are_deduplicated() {
        let subject = "\u{ad}19.06.2021 Your trip distance 4.2 km 21:05 Rua Augusta 10, Lisboa \
                       21:23 Avenida da Liberdade 1, Lisboa 21:40 Total 7.50€";
        let messages = vec![
            RawMessage::new("first", subject, ""),
            RawMessage::new("second", subject, ""),
        ];

        let uber = parse_messages(&ExpenseParser::uber_ride(), &messages);
        assert_eq!(uber.records.len(), 1);
        assert_eq!(uber.records[0].id(), "first");

        let bolt = parse_messages(&ExpenseParser::bolt_ride(), &messages);
        assert_eq!(bolt.records.len(), 2);
    }

    #[test]
    fn test_default_selections() {
        let tables = FilterTables::builtin();
        let cases = [
            (ExpenseParser::bolt_food(&tables), "portugal-food@bolt.eu", "Delivery from Bolt Food", true),
            (
                ExpenseParser::uber_eats(&tables, HeaderDateFallback::Now),
                "uber.portugal@uber.com",
                "Total",
                false,
            ),
            (ExpenseParser::bolt_ride(), "receipts-portugal@bolt.eu", "Your Bolt Trip On", true),
            (ExpenseParser::uber_ride(), "uber.portugal@uber.com", "Your trip", true),
            (ExpenseParser::banco_ctt(&tables), "documentos@bancoctt.pt", "Extrato", true),
        ];

        for (parser, sender, keywords, body) in cases {
            assert_eq!(parser.sender_email(), sender);
            assert_eq!(parser.keywords(), keywords);
            assert_eq!(parser.requires_body(), body);
        }
    }

    #[test]
    fn test_selection_override() {
        let parser = ExpenseParser::bolt_ride().with_selection(Some("me@example.com".to_string()), None);
        assert_eq!(parser.sender_email(), "me@example.com");
        assert_eq!(parser.keywords(), "Your Bolt Trip On");
    }
}
