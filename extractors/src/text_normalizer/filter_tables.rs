use serde::Deserialize;
use std::path::{Path, PathBuf};

const BUILTIN_FILTERS: &str = include_str!("../../data/filters.toml");

/// Ordered substring -> replacement rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterTable {
    #[serde(default)]
    pub rules: Vec<(String, String)>,
}

impl FilterTable {
    pub fn new<I, P, R>(rules: I) -> Self
    where
        I: IntoIterator<Item = (P, R)>,
        P: Into<String>,
        R: Into<String>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|(pattern, replacement)| (pattern.into(), replacement.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryRule {
    pub keyword: String,
    pub category: String,
}

/// All provider noise tables and bank category rules, loaded from one TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterTables {
    #[serde(default)]
    pub bolt_food: FilterTable,
    #[serde(default)]
    pub uber_eats: FilterTable,
    #[serde(default)]
    pub bank_categories: Vec<CategoryRule>,
}

#[derive(Debug, thiserror::Error)]
pub enum FilterTableError {
    #[error("Failed to read filter tables from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid filter tables: {0}")]
    Toml(#[from] toml::de::Error),
}

impl FilterTables {
    /// Tables shipped with the crate
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_FILTERS).expect("built-in filter tables are valid TOML")
    }

    pub fn from_toml_str(content: &str) -> Result<Self, FilterTableError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, FilterTableError> {
        let content = std::fs::read_to_string(path).map_err(|source| FilterTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tables = Self::from_toml_str(&content)?;
        tracing::info!(
            "Loaded filter tables from {:?} ({} bolt_food, {} uber_eats, {} bank category rules)",
            path,
            tables.bolt_food.rules.len(),
            tables.uber_eats.rules.len(),
            tables.bank_categories.len()
        );
        Ok(tables)
    }

    /// User tables when a path is configured, built-in tables otherwise
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, FilterTableError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }
}

/// First category whose keyword occurs in the description, "unknown" otherwise
pub fn categorize(description: &str, rules: &[CategoryRule]) -> String {
    rules
        .iter()
        .find(|rule| description.contains(&rule.keyword))
        .map(|rule| rule.category.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_tables_parse() {
        let tables = FilterTables::builtin();
        assert!(!tables.bolt_food.rules.is_empty());
        assert!(!tables.uber_eats.rules.is_empty());
        assert_eq!(tables.uber_eats.rules[0], ("&#39;".to_string(), "'".to_string()));
        assert_eq!(tables.bank_categories.len(), 3);
    }

    #[test]
    fn test_rules_keep_file_order() {
        let tables = FilterTables::from_toml_str(
            r#"
[uber_eats]
rules = [["b", "c"], ["a", "b"]]
"#,
        )
        .unwrap();

        assert_eq!(
            tables.uber_eats,
            FilterTable::new([("b", "c"), ("a", "b")])
        );
        assert!(tables.bolt_food.rules.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bolt_food]\nrules = [[\" (Rossio)\", \"\"]]").unwrap();

        let tables = FilterTables::load(file.path()).unwrap();
        assert_eq!(tables.bolt_food, FilterTable::new([(" (Rossio)", "")]));
    }

    #[test]
    fn test_load_missing_file() {
        let result = FilterTables::load(Path::new("/nonexistent/filters.toml"));
        assert!(matches!(result, Err(FilterTableError::Io { .. })));
    }

    #[test]
    fn test_invalid_toml() {
        let result = FilterTables::from_toml_str("[uber_eats]\nrules = \"nope\"");
        assert!(matches!(result, Err(FilterTableError::Toml(_))));
    }

    #[test]
    fn test_categorize() {
        let rules = FilterTables::builtin().bank_categories;
        assert_eq!(categorize("TRF ACTIVPAYROLL LDA", &rules), "salary");
        assert_eq!(categorize("COMPRA CUF DESCOBERTAS", &rules), "health");
        assert_eq!(categorize("COMPRA AUCHAN AMOREIRAS", &rules), "supermarket");
        assert_eq!(categorize("COMPRA PINGO DOCE", &rules), "unknown");
    }
}
