//! Store configuration and backend selection.

use crate::errors::StorageError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:///./chatbot.db";
pub const DEFAULT_TABLE: &str = "logs";

/// Where the log table lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// Local SQLite file.
    Sqlite { path: String },
    /// Remote libSQL database reached over HTTP (`https://` base URL).
    Remote { base_url: String },
}

/// Configuration for the interaction log store.
#[derive(Clone, Debug)]
pub struct LogStoreConfig {
    /// `DATABASE_URL` as given.
    pub database_url: String,
    /// Auth token for remote databases.
    pub auth_token: Option<String>,
    /// Table holding the interaction records.
    pub table: String,
}

impl LogStoreConfig {
    /// Reads `DATABASE_URL`, `TURSO_API_TOKEN` and `LOG_TABLE_NAME` from the environment.
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(&|k| std::env::var(k).ok())
    }

    /// Same as [`LogStoreConfig::from_env`] over an arbitrary lookup.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, StorageError> {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let cfg = Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            auth_token: get("TURSO_API_TOKEN"),
            table: get("LOG_TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE.into()),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Resolves which backend `database_url` points at.
    ///
    /// - `libsql://host` → `https://host`
    /// - `https://…` / `http://…` → used as is
    /// - `sqlite:///rel/or/abs`, `sqlite://path`, `file:path` or a bare path → SQLite file
    pub fn backend(&self) -> Result<StoreBackend, StorageError> {
        let url = self.database_url.trim();
        if url.is_empty() {
            return Err(StorageError::Config("DATABASE_URL is empty".into()));
        }
        if let Some(host) = url.strip_prefix("libsql://") {
            return Ok(StoreBackend::Remote {
                base_url: format!("https://{}", host.trim_end_matches('/')),
            });
        }
        if url.starts_with("https://") || url.starts_with("http://") {
            return Ok(StoreBackend::Remote {
                base_url: url.trim_end_matches('/').to_string(),
            });
        }
        let path = url
            .strip_prefix("sqlite:///")
            .or_else(|| url.strip_prefix("sqlite://"))
            .or_else(|| url.strip_prefix("file:"))
            .unwrap_or(url);
        if path.is_empty() {
            return Err(StorageError::Config(format!(
                "DATABASE_URL `{url}` has no file path"
            )));
        }
        Ok(StoreBackend::Sqlite {
            path: path.to_string(),
        })
    }

    /// Whether the configured backend needs `TURSO_API_TOKEN`.
    pub fn requires_token(&self) -> bool {
        matches!(self.backend(), Ok(StoreBackend::Remote { .. }))
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), StorageError> {
        self.backend()?;
        if !is_identifier(&self.table) {
            return Err(StorageError::Config(format!(
                "table name `{}` must match [A-Za-z_][A-Za-z0-9_]*",
                self.table
            )));
        }
        if self.requires_token() && self.auth_token.is_none() {
            return Err(StorageError::Config(
                "TURSO_API_TOKEN is required for a remote DATABASE_URL".into(),
            ));
        }
        Ok(())
    }
}

/// Table names are spliced into SQL text, so only plain identifiers pass.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
