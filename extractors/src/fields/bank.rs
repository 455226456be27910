use crate::text_normalizer::{categorize, dmy_to_iso, CategoryRule};
use regex::Regex;
use shared_types::{BankExpense, ExtractionError, RawMessage};
use std::sync::OnceLock;
use tracing::{info, warn};

fn transaction_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{2}-\d{2}-\d{4} \d{2}-\d{2}-\d{4}").expect("invalid transaction line regex")
    })
}

/// Parses one statement line:
/// `<booked DD-MM-YYYY> <value DD-MM-YYYY> <description...> <reference> <amount> <balance>`
pub fn parse_transaction_line(line: &str, rules: &[CategoryRule]) -> Option<BankExpense> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 5 {
        return None;
    }

    let len = tokens.len();
    let date = dmy_to_iso(tokens[1])?;
    let description = tokens[2..len - 3].join(" ");
    let category = categorize(&description, rules);

    Some(BankExpense::new(
        tokens[len - 3],
        description,
        tokens[len - 2],
        date,
        category,
    ))
}

/// All transactions found in the rendered text of a statement
pub fn parse_statement_text(text: &str, rules: &[CategoryRule]) -> Vec<BankExpense> {
    let mut expenses = Vec::new();

    for line in text.lines().map(str::trim) {
        if !transaction_line_re().is_match(line) {
            continue;
        }
        match parse_transaction_line(line, rules) {
            Some(expense) => expenses.push(expense),
            None => warn!("Skipping malformed statement line: {:?}", line),
        }
    }

    expenses
}

/// Transactions of every PDF statement attached to the message
pub fn statement_expenses(
    message: &RawMessage,
    rules: &[CategoryRule],
) -> Result<Vec<BankExpense>, ExtractionError> {
    let mut pdfs = message.pdf_attachments().peekable();
    if pdfs.peek().is_none() {
        return Err(ExtractionError::MissingAttachment);
    }

    let mut expenses = Vec::new();
    for attachment in pdfs {
        info!(
            "Parsing statement {} of message {}",
            attachment.filename, message.id
        );
        let text = statement_text(&attachment.content)
            .map_err(|e| ExtractionError::ParseError(format!("{}: {}", attachment.filename, e)))?;
        expenses.extend(parse_statement_text(&text, rules));
    }

    Ok(expenses)
}

fn statement_text(content: &[u8]) -> Result<String, String> {
    read_guarded(|| pdf_extract::extract_text_from_mem(content))
}

/// Runs a PDF read, reporting a panic inside the reader as an error so one
/// broken statement does not end the batch
fn read_guarded<E: std::fmt::Display>(
    read: impl FnOnce() -> Result<String, E> + std::panic::UnwindSafe,
) -> Result<String, String> {
    match std::panic::catch_unwind(read) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(format!("PDF reader panicked: {}", reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_normalizer::FilterTables;
    use crate::{parse_messages, ExpenseParser};
    use shared_types::{ExpenseRecord, MessageAttachment, TransactionType};

    const STATEMENT: &str = "\
BANCO CTT EXTRATO COMBINADO
Data Mov. Data Valor Descritivo Referência Montante Saldo
03-01-2022 03-01-2022 COMPRA AUCHAN AMOREIRAS 100234 -45.10 1454.90
28-01-2022 28-01-2022 TRF ACTIVPAYROLL LDA 100311 1500.00 2954.90
31-01-2022 31-01-2022 SALDO
Saldo final 2954.90";

    /// Single-page PDF with one Helvetica text line per entry
    fn statement_pdf(lines: &[&str]) -> Vec<u8> {
        let mut content = String::from("BT /F1 10 Tf 50 750 Td");
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                content.push_str(" 0 -20 Td");
            }
            content.push_str(&format!(" ({}) Tj", line));
        }
        content.push_str(" ET");

        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>".to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, object) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, object).as_bytes());
        }

        let xref_offset = pdf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        ));
        pdf.extend_from_slice(xref.as_bytes());
        pdf
    }

    #[test]
    fn test_statement_pdf_through_parser() {
        let tables = FilterTables::builtin();
        let mut message = RawMessage::new("m1", "Extrato Janeiro 2022", "Tue, 1 Feb 2022 09:00:00 +0000");
        message.attachments.push(MessageAttachment {
            filename: "extrato.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            content: statement_pdf(&[
                "BANCO CTT EXTRATO COMBINADO",
                "03-01-2022 03-01-2022 COMPRA AUCHAN AMOREIRAS 100234 -45.10 1454.90",
                "28-01-2022 28-01-2022 TRF ACTIVPAYROLL LDA 100311 1500.00 2954.90",
                "Saldo final 2954.90",
            ]),
        });

        let batch = parse_messages(&ExpenseParser::banco_ctt(&tables), &[message]);
        assert!(batch.failures.is_empty());

        let expenses: Vec<&BankExpense> = batch
            .records
            .iter()
            .map(|record| match record {
                ExpenseRecord::Bank(expense) => expense,
                other => panic!("unexpected record {:?}", other),
            })
            .collect();

        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].id, "100234");
        assert_eq!(expenses[0].total_euros, "45.10");
        assert_eq!(expenses[0].transaction_type, TransactionType::Debit);
        assert_eq!(expenses[0].category, "supermarket");
        assert_eq!(expenses[1].id, "100311");
        assert_eq!(expenses[1].total_euros, "1500.00");
        assert_eq!(expenses[1].transaction_type, TransactionType::Credit);
        assert_eq!(expenses[1].category, "salary");
    }

    #[test]
    fn test_reader_panic_becomes_error() {
        let result = read_guarded::<String>(|| panic!("invalid xref entry"));
        assert_eq!(
            result,
            Err("PDF reader panicked: invalid xref entry".to_string())
        );

        assert_eq!(read_guarded::<String>(|| Ok("text".to_string())), Ok("text".to_string()));
    }

    #[test]
    fn test_parse_statement_text() {
        let rules = FilterTables::builtin().bank_categories;
        let expenses = parse_statement_text(STATEMENT, &rules);

        assert_eq!(expenses.len(), 2);

        assert_eq!(expenses[0].id, "100234");
        assert_eq!(expenses[0].description, "COMPRA AUCHAN AMOREIRAS");
        assert_eq!(expenses[0].total_euros, "45.10");
        assert_eq!(expenses[0].date, "2022-01-03");
        assert_eq!(expenses[0].transaction_type, TransactionType::Debit);
        assert_eq!(expenses[0].category, "supermarket");

        assert_eq!(expenses[1].id, "100311");
        assert_eq!(expenses[1].transaction_type, TransactionType::Credit);
        assert_eq!(expenses[1].category, "salary");
    }

    #[test]
    fn test_short_line_is_rejected() {
        assert!(parse_transaction_line("31-01-2022 31-01-2022 SALDO", &[]).is_none());
    }

    #[test]
    fn test_message_without_pdf() {
        let mut message = RawMessage::new("m1", "Extrato", "");
        message.attachments.push(MessageAttachment {
            filename: "readme.txt".to_string(),
            content_type: "text/plain".to_string(),
            content: b"hello".to_vec(),
        });

        assert!(matches!(
            statement_expenses(&message, &[]),
            Err(ExtractionError::MissingAttachment)
        ));
    }

    #[test]
    fn test_unreadable_pdf_is_a_parse_error() {
        let mut message = RawMessage::new("m1", "Extrato", "");
        message.attachments.push(MessageAttachment {
            filename: "extrato.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            content: b"not a pdf".to_vec(),
        });

        assert!(matches!(
            statement_expenses(&message, &[]),
            Err(ExtractionError::ParseError(_))
        ));
    }
}
