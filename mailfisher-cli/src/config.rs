use config::{Config, ConfigError, Environment, File};
use extractors::HeaderDateFallback;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"
[imap]
host = "imap.gmail.com"
port = 993
# username = "you@gmail.com"
# Password is read from the OS keychain when not set here
# password = "app-password"
mailbox = "INBOX"

[fetch]
max_results = 1000
workers = 16

[extraction]
# Replace the built-in restaurant filters and bank categories
# filters_path = "/path/to/filters.toml"
# "now" or "empty"
header_date_fallback = "now"

# Needed by --upload
# [storage]
# endpoint = "https://storage.example.com"
# bucket = "expenses"
# token = "..."

[output]
directory = "exports"
"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub imap: ImapConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    pub storage: Option<StorageConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub mailbox: String,
}

impl Default for ImapConfig {
    fn default() -> Self {
        Self {
            host: "imap.gmail.com".to_string(),
            port: 993,
            username: None,
            password: None,
            mailbox: "INBOX".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FetchConfig {
    pub max_results: usize,
    pub workers: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_results: 1000,
            workers: 16,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ExtractionConfig {
    pub filters_path: Option<PathBuf>,
    #[serde(default)]
    pub header_date_fallback: HeaderDateFallback,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("exports"),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();
        let config = Self::load_from(&config_path)?;
        Ok((config, config_path))
    }

    /// Reads `config_path`, writing the default file first when it is missing.
    /// `MAILFISHER_*` variables override file values, e.g. `MAILFISHER_IMAP__USERNAME`.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
            tracing::info!("Wrote default config to {:?}", config_path);
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.to_path_buf()))
            .add_source(
                Environment::with_prefix("MAILFISHER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        builder.try_deserialize()
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("mailfisher").join("config.toml")
    } else {
        PathBuf::from("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_is_written_and_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mailfisher").join("config.toml");

        let config = AppConfig::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.imap.host, "imap.gmail.com");
        assert_eq!(config.imap.port, 993);
        assert_eq!(config.imap.username, None);
        assert_eq!(config.fetch.workers, 16);
        assert_eq!(config.fetch.max_results, 1000);
        assert_eq!(
            config.extraction.header_date_fallback,
            HeaderDateFallback::Now
        );
        assert!(config.storage.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[extraction]\nheader_date_fallback = \"empty\"\n\n[storage]\nendpoint = \"http://localhost:9000\"\nbucket = \"expenses\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();

        assert_eq!(
            config.extraction.header_date_fallback,
            HeaderDateFallback::Empty
        );
        assert_eq!(config.fetch.workers, 16);
        assert_eq!(config.imap.mailbox, "INBOX");

        let storage = config.storage.unwrap();
        assert_eq!(storage.bucket, "expenses");
        assert_eq!(storage.token, None);
    }

    #[test]
    fn test_invalid_fallback_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[extraction]\nheader_date_fallback = \"tomorrow\"\n").unwrap();

        assert!(AppConfig::load_from(&path).is_err());
    }
}
