use shared_types::*;
use std::fs;
use std::path::PathBuf;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for the JSON export schema
    let mut types = Vec::new();

    // Food types
    types.push(clean_type(FoodService::export_to_string()?));
    types.push(clean_type(FoodExpense::export_to_string()?));

    // Transportation types
    types.push(clean_type(TransportService::export_to_string()?));
    types.push(clean_type(TransportationExpense::export_to_string()?));

    // Bank types
    types.push(clean_type(TransactionType::export_to_string()?));
    types.push(clean_type(BankExpense::export_to_string()?));

    types.push(clean_type(ExpenseRecord::export_to_string()?));

    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("bindings"));
    fs::create_dir_all(&output_dir)?;

    let output_path = output_dir.join("expenses.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Types are concatenated into one file, so imports between them are dropped
    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
