//! Pure string transforms shared by every provider parser.

mod filter_tables;

pub use filter_tables::{categorize, CategoryRule, FilterTable, FilterTableError, FilterTables};

/// Literal, ordered substring replacement. Each rule sees the output of the
/// previous one, so the result is not idempotent for every table.
pub fn apply_filters(text: &str, table: &FilterTable) -> String {
    table
        .rules
        .iter()
        // An empty pattern would interleave the replacement between every char
        .filter(|(pattern, _)| !pattern.is_empty())
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            acc.replace(pattern.as_str(), replacement)
        })
}

/// Cuts "Restaurant - Address" leftovers at the first hyphen
pub fn trim_at_hyphen(name: &str) -> String {
    match name.find('-') {
        Some(index) => name[..index].trim().to_string(),
        None => name.trim().to_string(),
    }
}

pub fn normalize_restaurant(raw: &str, table: &FilterTable) -> String {
    trim_at_hyphen(&apply_filters(raw, table))
}

/// Parses "€16.95", "*9.73€*", "5,40 €" and friends. Result is rounded to cents.
pub fn parse_euros(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_matches('*')
        .replace('€', "")
        .trim()
        .replace(',', ".");

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    Some((value * 100.0).round() / 100.0)
}

/// "DD-MM-YYYY" -> "YYYY-MM-DD" by swapping the parts. No calendar validation.
pub fn dmy_to_iso(token: &str) -> Option<String> {
    let parts: Vec<&str> = token.split('-').collect();
    if parts.len() < 3 {
        return None;
    }
    Some(format!("{}-{}-{}", parts[2], parts[1], parts[0]))
}
