use super::message_parser::parse_raw_message;
use super::MailSource;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use imap::ClientBuilder;
use shared_types::{MessageQuery, RawMessage};
use std::sync::Mutex;

type ImapSession = imap::Session<imap::Connection>;

#[derive(Debug, Clone)]
pub struct ImapCredentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub mailbox: String,
}

/// IMAP mail source. Sessions are pooled so fetch workers can run side by side,
/// one session per worker at most.
pub struct RealImapClient {
    credentials: ImapCredentials,
    sessions: Mutex<Vec<ImapSession>>,
}

impl RealImapClient {
    /// Connects once up front so bad credentials fail the run early
    pub fn connect_with_password(credentials: ImapCredentials) -> Result<Self> {
        let session = Self::open_session(&credentials)?;
        tracing::info!(
            "Connected to IMAP server {}:{} as {}",
            credentials.host,
            credentials.port,
            credentials.username
        );

        Ok(Self {
            credentials,
            sessions: Mutex::new(vec![session]),
        })
    }

    fn open_session(credentials: &ImapCredentials) -> Result<ImapSession> {
        let client = ClientBuilder::new(credentials.host.as_str(), credentials.port)
            .connect()
            .context("Failed to connect to IMAP server")?;

        let mut session = client
            .login(&credentials.username, &credentials.password)
            .map_err(|e| anyhow::anyhow!("IMAP login failed: {:?}", e.0))?;

        session
            .select(&credentials.mailbox)
            .with_context(|| format!("Failed to select mailbox {}", credentials.mailbox))?;

        Ok(session)
    }

    fn checkout(&self) -> Result<ImapSession> {
        let pooled = self
            .sessions
            .lock()
            .map_err(|_| anyhow::anyhow!("IMAP session pool poisoned"))?
            .pop();

        match pooled {
            Some(session) => Ok(session),
            None => Self::open_session(&self.credentials),
        }
    }

    fn checkin(&self, session: ImapSession) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.push(session);
        }
    }

    /// Runs `op` on a pooled session. Sessions that hit an error are dropped.
    fn with_session<T>(&self, op: impl FnOnce(&mut ImapSession) -> Result<T>) -> Result<T> {
        let mut session = self.checkout()?;
        let result = op(&mut session);
        if result.is_ok() {
            self.checkin(session);
        }
        result
    }
}

fn imap_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// IMAP SEARCH criteria for the query
pub fn build_search_query(query: &MessageQuery) -> String {
    let mut criteria = Vec::new();

    if !query.sender_email.is_empty() {
        criteria.push(format!("FROM {}", quote(&query.sender_email)));
    }
    if !query.keywords.is_empty() {
        criteria.push(format!("TEXT {}", quote(&query.keywords)));
    }
    if let Some(start) = query.start_date {
        criteria.push(format!("SINCE {}", imap_date(start)));
    }
    if let Some(end) = query.end_date {
        criteria.push(format!("BEFORE {}", imap_date(end)));
    }

    if criteria.is_empty() {
        "ALL".to_string()
    } else {
        criteria.join(" ")
    }
}

impl MailSource for RealImapClient {
    fn search(&self, query: &MessageQuery) -> Result<Vec<String>> {
        let search = build_search_query(query);
        tracing::info!("IMAP SEARCH query: {}", search);

        let uids = self.with_session(|session| Ok(session.uid_search(&search)?))?;

        let mut uids: Vec<u32> = uids.into_iter().collect();
        uids.sort_unstable_by(|a, b| b.cmp(a));
        uids.truncate(query.max_results);

        Ok(uids.into_iter().map(|uid| uid.to_string()).collect())
    }

    fn fetch(&self, id: &str, fetch_body: bool) -> Result<RawMessage> {
        let bytes = self.with_session(|session| {
            let messages = session.uid_fetch(id, "RFC822")?;
            let message = messages.iter().next().context("Email not found")?;
            let body = message.body().context("Email has no body")?;
            Ok(body.to_vec())
        })?;

        parse_raw_message(id, &bytes, fetch_body)
    }
}
