use keyring::Entry;

const SERVICE_NAME: &str = "mailfisher-imap";

#[derive(Debug)]
pub enum KeyringError {
    NotFound,
    ServiceUnavailable(String),
    OperationFailed(String),
}

impl std::fmt::Display for KeyringError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyringError::NotFound => write!(f, "Credential not found in keychain"),
            KeyringError::ServiceUnavailable(msg) => {
                write!(f, "Keychain service unavailable: {}", msg)
            }
            KeyringError::OperationFailed(msg) => write!(f, "Keychain operation failed: {}", msg),
        }
    }
}

impl std::error::Error for KeyringError {}

/// IMAP passwords stored in the OS keychain, one entry per `host:username`
pub struct KeyringService;

impl KeyringService {
    fn keychain_username(host: &str, username: &str) -> String {
        format!("{}:{}", host, username)
    }

    fn entry(host: &str, username: &str) -> Result<Entry, KeyringError> {
        Entry::new(SERVICE_NAME, &Self::keychain_username(host, username)).map_err(|e| {
            KeyringError::ServiceUnavailable(format!("Failed to create keychain entry: {}", e))
        })
    }

    pub fn set_password(host: &str, username: &str, password: &str) -> Result<(), KeyringError> {
        Self::entry(host, username)?
            .set_password(password)
            .map_err(|e| KeyringError::OperationFailed(format!("Failed to store password: {}", e)))
    }

    pub fn get_password(host: &str, username: &str) -> Result<String, KeyringError> {
        Self::entry(host, username)?.get_password().map_err(|e| {
            if matches!(e, keyring::Error::NoEntry) {
                KeyringError::NotFound
            } else {
                KeyringError::OperationFailed(format!("Failed to retrieve password: {}", e))
            }
        })
    }
}
